/// Escape template delimiters inside a substituted value so the rendered
/// output cannot open new tags: `{{` becomes `\{{` and `}}` becomes `\}}`.
pub fn sanitize(value: &str) -> String {
    if !value.contains("{{") && !value.contains("}}") {
        return value.to_string();
    }
    value.replace("{{", "\\{{").replace("}}", "\\}}")
}
