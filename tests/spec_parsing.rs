//! Integration tests for template spec parsing and validation

mod common;

use common::create_test_home;
use scaff::config::{list_templates, load_template, parse_spec, template_dir, validate_spec};
use scaff::error::{ConfigError, ScaffError};
use scaff::runner::{Context, Step};

#[test]
fn test_parse_complete_spec() {
    let yaml = r#"
metadata:
  name: go-service
  description: Go micro-service
  version: 1.2.0
vars:
  port: 8080
  tags: [web, api]
actions:
  create:
    - input:
        question: Name?
        var: name
    - option:
        question: With database?
        var: db
        default: true
    - if: .db
      then:
        set:
          driver: postgres
    - render: ./src
  update:
    exec: go mod tidy
"#;

    let spec = parse_spec(yaml).unwrap();
    validate_spec(&spec).unwrap();

    assert_eq!(spec.metadata.name.as_deref(), Some("go-service"));
    assert_eq!(spec.metadata.version.as_deref(), Some("1.2.0"));
    assert_eq!(spec.vars.len(), 2);
    assert_eq!(spec.actions["create"].steps.len(), 4);
    assert_eq!(spec.actions["update"].steps.len(), 1);

    let ctx = Context::new().with_spec(&spec).unwrap();
    let create = ctx.action("create").unwrap();
    assert!(matches!(create.0[0], Step::Prompt(_)));
    assert!(matches!(create.0[1], Step::Confirm(_)));
    match &create.0[2] {
        Step::If(step) => {
            assert_eq!(step.condition, ".db");
            assert_eq!(step.then.len(), 1);
        }
        other => panic!("expected if step, got {}", other),
    }
    assert!(matches!(create.0[3], Step::Render(_)));
}

#[test]
fn test_invalid_step_shape_rejected() {
    let spec = parse_spec(
        r#"
actions:
  create:
    - input:
        question: Name?
        var: name
      exec: ls
"#,
    )
    .unwrap();

    let result = validate_spec(&spec);
    assert!(matches!(result, Err(ConfigError::InvalidStep { .. })));
    assert!(Context::new().with_spec(&spec).is_err());
}

#[test]
fn test_input_without_var_rejected() {
    let result = parse_spec(
        r#"
actions:
  create:
    - input:
        question: Name?
"#,
    );
    assert!(matches!(result, Err(ScaffError::Yaml(_))));
}

#[test]
fn test_load_template_from_home() {
    let (home, _) = create_test_home("svc", "actions:\n  create:\n    exec: \"true\"\n");

    assert_eq!(list_templates(home.path()).unwrap(), vec!["svc"]);

    let dir = template_dir(home.path(), "svc").unwrap();
    let spec = load_template(&dir).unwrap();
    assert!(spec.actions.contains_key("create"));

    assert!(matches!(
        template_dir(home.path(), "other"),
        Err(ConfigError::TemplateNotFound(_))
    ));
}
