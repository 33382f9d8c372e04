pub mod annotation;
pub mod emitter;
pub mod output;
pub mod package;
pub mod template;
pub mod templates;

pub use annotation::{Annotation, AnnotationSynthesizer, FieldTags, ValidationCheck};
pub use emitter::{Artifact, EmissionReport, Emitter, TemplateSet};
pub use package::Package;
pub use template::Template;
