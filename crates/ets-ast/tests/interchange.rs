//! Reading units from the JSON interchange format.

#![cfg(feature = "serde")]

use ets_ast::{
    load_unit, CallReceiver, CompositionNode, IterationArg, Item, LoadErrorKind, MemberKind,
    MethodBody, TypeRef,
};
use pretty_assertions::assert_eq;

const UNIT: &str = r#"{
  "file_name": "pages/Index.ets",
  "items": [
    { "item": "verbatim", "text": "import router from '@ohos.router';" },
    {
      "item": "component",
      "name": "Index",
      "decorators": [{ "name": "Entry" }, { "name": "Component" }],
      "members": [
        {
          "name": "count",
          "decorators": [{ "name": "State" }],
          "kind": "property",
          "ty": "number",
          "initializer": "0"
        },
        {
          "name": "items",
          "decorators": [{ "name": "Link" }],
          "kind": "property",
          "ty": { "array": { "named": "Fruit" } }
        },
        {
          "name": "build",
          "kind": "method",
          "body": {
            "composition": [
              {
                "node": "builtin",
                "name": "Column",
                "children": [
                  {
                    "node": "iteration",
                    "kind": "ForEach",
                    "args": [
                      "this.items",
                      { "params": ["item"], "body": [{ "node": "builtin", "name": "Text", "args": ["item.name"] }] },
                      "item => item.id"
                    ]
                  },
                  { "node": "builder", "callee": "footer", "receiver": "this" }
                ]
              }
            ]
          }
        }
      ]
    }
  ]
}"#;

#[test]
fn test_load_component_unit() {
    let unit = load_unit(UNIT).expect("unit should load");
    assert_eq!(unit.file_name, "pages/Index.ets");
    assert_eq!(unit.items.len(), 2);
    assert!(matches!(unit.items[0], Item::Verbatim(_)));

    let index = unit.component("Index").unwrap();
    assert!(index.entry().is_some());

    let count = index.member("count").unwrap();
    assert_eq!(count.ty(), Some(&TypeRef::Number));
    assert_eq!(count.initializer().map(|e| e.as_str()), Some("0"));

    let items = index.member("items").unwrap();
    assert_eq!(
        items.ty(),
        Some(&TypeRef::Array(Box::new(TypeRef::named("Fruit"))))
    );
    assert!(matches!(items.kind, MemberKind::Property { initializer: None, .. }));
}

#[test]
fn test_load_composition_tree() {
    let unit = load_unit(UNIT).unwrap();
    let build = unit.component("Index").unwrap().build().unwrap();
    let CompositionNode::Builtin(column) = &build[0] else {
        panic!("expected builtin");
    };
    let children = column.children.as_ref().unwrap();

    let CompositionNode::Iteration(each) = &children[0] else {
        panic!("expected iteration");
    };
    assert_eq!(each.args.len(), 3);
    assert!(matches!(&each.args[0], IterationArg::Expr(e) if e.as_str() == "this.items"));
    assert!(matches!(&each.args[1], IterationArg::Generator(g) if g.params == ["item"]));

    let CompositionNode::Builder(footer) = &children[1] else {
        panic!("expected builder call");
    };
    assert_eq!(footer.receiver, CallReceiver::This);
}

#[test]
fn test_load_rejects_bad_shape() {
    let err = load_unit(r#"{ "file_name": "a.ets", "items": [ { "item": "component" } ] }"#)
        .unwrap_err();
    assert!(matches!(err.kind, LoadErrorKind::Malformed { .. }));
}

#[test]
fn test_load_rejects_empty_file_name() {
    let err = load_unit(r#"{ "file_name": " ", "items": [] }"#).unwrap_err();
    assert!(matches!(err.kind, LoadErrorKind::MissingFileName));
}

#[test]
fn test_method_body_forms() {
    let unit = load_unit(
        r#"{
          "file_name": "styles.ets",
          "items": [
            {
              "item": "function",
              "name": "fancy",
              "decorators": [{ "name": "Styles" }],
              "body": { "attributes": [{ "name": "width", "args": ["100"] }] }
            }
          ]
        }"#,
    )
    .unwrap();
    let fancy = unit.functions().next().unwrap();
    assert!(matches!(&fancy.body, MethodBody::Attributes(attrs) if attrs[0].name == "width"));
}
