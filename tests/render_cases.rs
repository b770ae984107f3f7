use shimmybars::{
    render, try_render, Engine, EngineOptions, ListFormat, ParseError, TemplateError, Value,
    ValueContext, VariableDefinition, VariableType,
};

fn list_def(key: &str, format: ListFormat) -> VariableDefinition {
    VariableDefinition::new(key, key, VariableType::Array).with_format(format)
}

#[test]
fn plain_text_template_no_tags() {
    let template = "Summarize the following text in three sentences.\n";
    assert_eq!(render(template, &ValueContext::new(), &[]), template);
}

#[test]
fn default_fallback() {
    let defs = [VariableDefinition::new("age", "Age", VariableType::Number).with_default("25")];
    assert_eq!(render("Age: {{age}}", &ValueContext::new(), &defs), "Age: 25");
}

#[test]
fn missing_without_default_leaves_placeholder() {
    let defs = [VariableDefinition::text("city")];
    assert_eq!(render("City: {{city}}", &ValueContext::new(), &defs), "City: {{city}}");
}

#[test]
fn empty_string_is_falsy() {
    let ctx = ValueContext::new().with("name", "");
    assert_eq!(render("{{#if name}}Hi {{name}}{{/if}}", &ctx, &[]), "");
}

#[test]
fn nested_blocks() {
    let template = "{{#if a}}{{#if b}}AB{{/if}}{{/if}}";
    let both = ValueContext::new().with("a", true).with("b", true);
    let no_b = ValueContext::new().with("a", true).with("b", false);
    assert_eq!(render(template, &both, &[]), "AB");
    assert_eq!(render(template, &no_b, &[]), "");
    for b in [true, false] {
        let ctx = ValueContext::new().with("a", false).with("b", b);
        assert_eq!(render(template, &ctx, &[]), "");
    }
}

#[test]
fn comparison_helper() {
    let template = r#"{{#if (eq tone "formal")}}Formal{{else}}Casual{{/if}}"#;
    let formal = ValueContext::new().with("tone", "formal");
    let casual = ValueContext::new().with("tone", "casual");
    assert_eq!(render(template, &formal, &[]), "Formal");
    assert_eq!(render(template, &casual, &[]), "Casual");
}

#[test]
fn array_formatting() {
    let ctx = ValueContext::new().with("items", vec!["a", "b", "c"]);
    assert_eq!(
        render("{{items}}", &ctx, &[list_def("items", ListFormat::Numbered)]),
        "1. a\n2. b\n3. c"
    );
    assert_eq!(
        render("{{items}}", &ctx, &[list_def("items", ListFormat::Bullet)]),
        "- a\n- b\n- c"
    );
    assert_eq!(
        render("{{items}}", &ctx, &[list_def("items", ListFormat::Newline)]),
        "a\nb\nc"
    );
    // comma is the default, with or without a definition
    assert_eq!(render("{{items}}", &ctx, &[]), "a, b, c");
}

#[test]
fn empty_list_is_present_but_empty() {
    let defs = [list_def("items", ListFormat::Bullet).with_default(vec!["x"])];
    let ctx = ValueContext::new().with("items", Vec::<String>::new());
    assert_eq!(render("[{{items}}]{{#if items}}!{{/if}}", &ctx, &defs), "[]");
}

#[test]
fn sanitization() {
    let ctx = ValueContext::new().with("input", "Hello {{name}}");
    assert_eq!(render("Said: {{input}}", &ctx, &[]), "Said: Hello \\{{name\\}}");
}

#[test]
fn sanitized_output_survives_a_second_pass() {
    let ctx = ValueContext::new()
        .with("input", "{{#if x}}boom{{/if}}")
        .with("x", true);
    let once = render("> {{input}}", &ctx, &[]);
    let twice = render(&once, &ctx, &[]);
    assert_eq!(once, r"> \{{#if x\}}boom\{{/if\}}");
    assert_eq!(twice, once);
}

#[test]
fn static_text_is_not_sanitized() {
    let ctx = ValueContext::new().with("v", "}}");
    assert_eq!(render("a }} b {{v}}", &ctx, &[]), "a }} b \\}}");
}

#[test]
fn malformed_syntax_degrades_gracefully() {
    assert_eq!(render("{{#if unclosed}", &ValueContext::new(), &[]), "{{#if unclosed}");
    let broken = "Intro {{name}} {{#if a}}{{#if b}}x{{/if}}";
    let ctx = ValueContext::new().with("name", "Ann");
    assert_eq!(render(broken, &ctx, &[]), broken);
}

#[test]
fn try_render_reports_structure_errors() {
    let err = try_render("{{#if a}}{{else}}{{else}}{{/if}}", &ValueContext::new(), &[])
        .unwrap_err();
    assert_eq!(err, TemplateError::Parse(ParseError::MultipleElse { at: 17 }));
}

#[test]
fn unrecognised_tag_with_block_end_fails_to_parse() {
    // the open tag is not valid syntax, so the close tag is unmatched
    let template = r#"{{#if (eq tone)}}x{{/if}}"#;
    assert!(try_render(template, &ValueContext::new(), &[]).is_err());
    assert_eq!(render(template, &ValueContext::new(), &[]), template);
}

#[test]
fn numeric_comparisons() {
    let template = "{{#if (gte words 500)}}long{{else}}short{{/if}}";
    let cases: [(Value, &str); 4] = [
        (Value::from(800i64), "long"),
        (Value::from("500"), "long"),
        (Value::from("99"), "short"),
        (Value::from("lots"), "short"),
    ];
    for (value, expected) in cases {
        let ctx = ValueContext::new().with("words", value);
        assert_eq!(render(template, &ctx, &[]), expected);
    }
}

#[test]
fn comparison_uses_default_when_unset() {
    let defs = [VariableDefinition::new("lang", "Language", VariableType::Select)
        .with_options(["en", "fr"])
        .with_default("fr")];
    let template = r#"{{#if (ne lang "en")}}Translate to {{lang}}.{{/if}}"#;
    assert_eq!(render(template, &ValueContext::new(), &defs), "Translate to fr.");
}

#[test]
fn nesting_ceiling_falls_back_to_source() {
    let engine = Engine::new(EngineOptions::default().with_max_nesting_depth(1));
    let template = "{{#if a}}{{#if b}}x{{/if}}{{/if}}";
    let ctx = ValueContext::new().with("a", true).with("b", true);
    assert_eq!(engine.render(template, &ctx, &[]), template);
    assert_eq!(Engine::default().render(template, &ctx, &[]), "x");
}

#[test]
fn realistic_prompt() {
    let template = "\
You are a {{role}}.
{{#if audience}}Write for {{audience}}.
{{/if}}{{#unless (eq tone \"neutral\")}}Use a {{tone}} tone.
{{/unless}}Cover:
{{topics}}
{{#if (gt max_words 0)}}Stay under {{max_words}} words.{{else}}No length limit.{{/if}}";

    let defs = [
        VariableDefinition::text("role").with_default("helpful assistant"),
        VariableDefinition::text("audience"),
        VariableDefinition::new("tone", "Tone", VariableType::Select)
            .with_options(["neutral", "friendly", "formal"])
            .with_default("neutral"),
        VariableDefinition::new("topics", "Topics", VariableType::MultiSelect)
            .with_format(ListFormat::Numbered),
        VariableDefinition::new("max_words", "Max words", VariableType::Slider).with_default(0i64),
    ];
    let ctx = ValueContext::new()
        .with("audience", "new engineers")
        .with("tone", "friendly")
        .with("topics", vec!["ownership", "borrowing"])
        .with("max_words", 300i64);

    let expected = "\
You are a helpful assistant.
Write for new engineers.
Use a friendly tone.
Cover:
1. ownership
2. borrowing
Stay under 300 words.";
    assert_eq!(render(template, &ctx, &defs), expected);

    let bare = ValueContext::new().with("topics", vec!["x"]);
    let expected_bare = "\
You are a helpful assistant.
Cover:
1. x
No length limit.";
    assert_eq!(render(template, &bare, &defs), expected_bare);
}
