//! Built-in template programs for go-pg models

/// Every entity of the package in one file
pub const MODEL: &str = r#"//nolint
//lint:file-ignore U1000 ignore unused code, it's generated
package {{.Package}}
{{- if .HasImports}}

import (
{{- range .Imports}}
	"{{.}}"
{{- end}}
)
{{- end}}
{{range .Entities}}
type {{.Name}} struct {
	tableName struct{} {{.Tag}}
{{range .Columns}}
	{{.Name}} {{.Type}} {{.Tag}}{{if .Comment}} {{.Comment}}{{end}}
{{- end}}
{{- if .HasRelations}}
{{range .Relations}}
	{{.Name}} *{{.Type}} {{.Tag}}{{if .Comment}} {{.Comment}}{{end}}
{{- end}}
{{- end}}
}
{{end}}"#;

/// One entity per file, with lifecycle hooks
pub const ENTITY: &str = r#"//nolint
//lint:file-ignore U1000 ignore unused code, it's generated
package {{.Package}}
{{- if .HasImports}}

import (
{{- range .Imports}}
	"{{.}}"
{{- end}}
)
{{- end}}
{{range .Entities}}
type {{.Name}} struct {
	tableName struct{} {{.Tag}}
{{range .Columns}}
	{{.Name}} {{.Type}} {{.Tag}}{{if .Comment}} {{.Comment}}{{end}}
{{- end}}
{{- if .HasRelations}}
{{range .Relations}}
	{{.Name}} *{{.Type}} {{.Tag}}{{if .Comment}} {{.Comment}}{{end}}
{{- end}}
{{- end}}
}

func (m *{{.Name}}) Name() string {
	return "{{.Name}}"
}

func (m *{{.Name}}) BeforeInsert(u Int64Str, now *time.Time) {
{{- if .HasCreateBy}}
	m.CreateBy = u
{{- end}}
{{- if .HasCreateDt}}
	m.CreateDt = now
{{- end}}
{{- if .HasUpdateBy}}
	m.UpdateBy = u
{{- end}}
{{- if .HasUpdateDt}}
	m.UpdateDt = now
{{- end}}
}

func (m *{{.Name}}) BeforeUpdate(u Int64Str, now *time.Time) {
{{- if .HasUpdateBy}}
	m.UpdateBy = u
{{- end}}
{{- if .HasUpdateDt}}
	m.UpdateDt = now
{{- end}}
}

func (m *{{.Name}}) BeforeArchive(u Int64Str, now *time.Time) {
{{- if .HasArchiveBy}}
	m.ArchiveBy = u
{{- end}}
{{- if .HasArchiveDt}}
	m.ArchiveDt = now
{{- end}}
{{- if .HasUpdateBy}}
	m.UpdateBy = u
{{- end}}
{{- if .HasUpdateDt}}
	m.UpdateDt = now
{{- end}}
}
{{end}}"#;

/// Enumeration constants shared by every entity
pub const ENUMS: &str = r#"//nolint
//lint:file-ignore U1000 ignore unused code, it's generated
package constant
{{- if .HasEnums}}

const (
{{- range .Enums}}
{{- range .Entries}}
	{{.Constant}} = {{.Literal}}
{{- end}}
{{- end}}
)
{{- end}}
"#;

/// Column and table name constants for the per-entity layout
pub const COLUMNS: &str = r#"//nolint
//lint:file-ignore U1000 ignore unused code, it's generated
package {{.Package}}

// Int64Str is the identity type passed to lifecycle hooks
type Int64Str = int64
{{range .Entities}}
type Columns{{.Name}} struct {
{{- range .Columns}}
	{{.Name}} string
{{- end}}
{{- range .Relations}}
	{{.Name}} string
{{- end}}
}
{{end}}
type ColumnsSt struct {
{{- range .Entities}}
	{{.Name}} Columns{{.Name}}
{{- end}}
}

var Columns = ColumnsSt{
{{- range .Entities}}
	{{.Name}}: Columns{{.Name}}{
{{- range .Columns}}
		{{.Name}}: "{{.SourceName}}",
{{- end}}
{{- range .Relations}}
		{{.Name}}: "{{.Name}}",
{{- end}}
	},
{{- end}}
}

type TableSt struct {
	Name  string
	Alias string
}

type TablesSt struct {
{{- range .Entities}}
	{{.Name}} TableSt
{{- end}}
}

var Tables = TablesSt{
{{- range .Entities}}
	{{.Name}}: TableSt{
		Name: "{{.FullName}}",
{{- if not .NoAlias}}
		Alias: "{{.Alias}}",
{{- end}}
	},
{{- end}}
}
"#;
