//! End-to-end tests for unit lowering.
//!
//! Each test builds a small component tree in Rust, lowers it and checks the emitted
//! JavaScript.

use ets_ast::{
    AttributeCall, BuilderInvocation, BuiltinInvocation, ComponentDecl, ComponentInvocation,
    CompositionNode, ConditionalBlock, Decorator, EnumDecl, EnumMember, FunctionDecl,
    IterationArg, IterationBlock, MemberDecl, MethodBody, Param, SourceUnit, TypeRef, Verbatim,
};
use ets_diagnostics::DiagnosticCode;
use ets_lowering::{lower_unit, LowerErrorKind, LowerOptions, RouteMode, UpdateMode};
use pretty_assertions::assert_eq;

fn state(name: &str, ty: TypeRef, init: &str) -> MemberDecl {
    MemberDecl::property(name, Some(ty), Some(init)).with_decorator(Decorator::new("State"))
}

fn lower(unit: &SourceUnit, options: &LowerOptions) -> String {
    match lower_unit(unit, options) {
        Ok(output) => output.code,
        Err(errors) => panic!("lowering failed: {errors:?}"),
    }
}

fn position(code: &str, needle: &str) -> usize {
    code.find(needle)
        .unwrap_or_else(|| panic!("`{needle}` not found in:\n{code}"))
}

fn counter_unit() -> SourceUnit {
    let counter = ComponentDecl::new("Counter")
        .with_member(state("count", TypeRef::Number, "0"))
        .with_build(vec![BuiltinInvocation::new("Column")
            .child(
                BuiltinInvocation::new("Button")
                    .arg("\"x\"")
                    .attr("onClick", ["() => { this.count++ }"]),
            )
            .into()]);
    SourceUnit::new("pages/Counter.ets").with_item(counter)
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[test]
fn test_state_member_wrapper() {
    let code = lower(&counter_unit(), &LowerOptions::partial());
    assert!(code.contains("this.__count = new ObservedPropertySimplePU(0, this, \"count\");"));
    assert!(code.contains("    get count() {\n        return this.__count.get();\n    }"));
    assert!(code.contains("    set count(newValue) {\n        this.__count.set(newValue);\n    }"));
    assert!(code.contains("this.__count.aboutToBeDeleted();"));
    assert!(code.contains("this.__count.purgeDependencyOnElmtId(rmElmtId);"));
}

#[test]
fn test_button_click_in_partial_mode() {
    let code = lower(&counter_unit(), &LowerOptions::partial());
    let observe = position(&code, "this.observeComponentCreation2((elmtId, isInitialRender) => {\n                Button.createWithLabel(\"x\");");
    let click = position(&code, "Button.onClick(() => { this.count++ });");
    let tag = position(&code, "}, Button);");
    let pop = position(&code, "Button.pop();");
    assert!(observe < click && click < tag && tag < pop);
    assert!(code[tag..pop].trim_start_matches("}, Button);").trim().is_empty());
}

#[test]
fn test_for_each_key_passed_verbatim() {
    let list = ComponentDecl::new("List")
        .with_member(state("arr", TypeRef::Array(Box::new(TypeRef::Number)), "[1, 2]"))
        .with_build(vec![IterationBlock::for_each(vec![
            IterationArg::expr("this.arr"),
            IterationArg::generator(
                ["item"],
                vec![BuiltinInvocation::new("Text").arg("item").into()],
            ),
            IterationArg::expr("item => item.toString()"),
        ])
        .into()]);
    let code = lower(
        &SourceUnit::new("List.ets").with_item(list),
        &LowerOptions::partial(),
    );
    assert!(code.contains("ForEach.create();"));
    assert!(code.contains("const forEachItemGenFunction = _item => {"));
    assert!(code.contains("const item = _item;"));
    assert!(code.contains(
        "this.forEachUpdateFunction(elmtId, this.arr, forEachItemGenFunction, item => item.toString(), false, false);"
    ));
    assert!(code.contains("ForEach.pop();"));
}

#[test]
fn test_two_way_binding_in_attribute() {
    let search = ComponentDecl::new("Find")
        .with_member(state("value", TypeRef::String, "''"))
        .with_build(vec![BuiltinInvocation::new("Search")
            .attr("value", ["$$this.value"])
            .into()]);
    let code = lower(
        &SourceUnit::new("Find.ets").with_item(search),
        &LowerOptions::partial(),
    );
    assert!(code.contains(
        "Search.value({ value: this.value, changeEvent: newValue => { this.value = newValue; } });"
    ));
}

#[test]
fn test_conflicting_decorators_abort_unit() {
    let broken = ComponentDecl::new("Broken").with_member(
        MemberDecl::property("count", Some(TypeRef::Number), Some("0"))
            .with_decorator(Decorator::new("State"))
            .with_decorator(Decorator::new("Link")),
    );
    let unit = SourceUnit::new("Broken.ets")
        .with_item(broken)
        .with_item(counter_unit().items.remove(0));

    let errors = lower_unit(&unit, &LowerOptions::partial()).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].kind,
        LowerErrorKind::ClassificationConflict {
            member: "count".into(),
            first: "State".into(),
            second: "Link".into(),
        }
    );
}

#[test]
fn test_errors_collected_across_components() {
    let unkeyed = ComponentDecl::new("Unkeyed").with_build(vec![IterationBlock::for_each(vec![
        IterationArg::expr("this.rows"),
        IterationArg::generator(["row"], Vec::new()),
    ])
    .into()]);
    let unbound = ComponentDecl::new("Unbound").with_build(vec![BuiltinInvocation::new("Toggle")
        .arg("{ isOn: $$this.ghost }")
        .into()]);
    let unit = SourceUnit::new("Many.ets").with_item(unkeyed).with_item(unbound);

    let errors = lower_unit(&unit, &LowerOptions::partial()).unwrap_err();
    let codes: Vec<_> = errors.iter().map(|err| err.code()).collect();
    assert_eq!(
        codes,
        vec![DiagnosticCode::MissingKey, DiagnosticCode::UnresolvedBinding]
    );
}

// ============================================================================
// STRUCTURAL PROPERTIES
// ============================================================================

fn nested_tree() -> Vec<CompositionNode> {
    vec![BuiltinInvocation::new("Column")
        .child(BuiltinInvocation::new("Row").child(BuiltinInvocation::new("Text").arg("'a'")))
        .child(
            ConditionalBlock::new()
                .when("this.flag", vec![BuiltinInvocation::new("Text").arg("'on'").into()])
                .otherwise(vec![BuiltinInvocation::new("Stack").with_block().into()]),
        )
        .child(IterationBlock::for_each(vec![
            IterationArg::expr("this.rows"),
            IterationArg::generator(
                ["row"],
                vec![BuiltinInvocation::new("Text").arg("row").into()],
            ),
            IterationArg::expr("row => row"),
        ]))
        .into()]
}

fn tree_unit() -> SourceUnit {
    let page = ComponentDecl::new("Tree")
        .with_member(state("flag", TypeRef::Boolean, "true"))
        .with_member(state("rows", TypeRef::Array(Box::new(TypeRef::String)), "[]"))
        .with_build(nested_tree());
    SourceUnit::new("Tree.ets").with_item(page)
}

#[test]
fn test_open_close_balance_in_both_modes() {
    for options in [LowerOptions::legacy(), LowerOptions::partial()] {
        let code = lower(&tree_unit(), &options);
        for name in ["Column", "Row", "Text", "Stack", "If", "ForEach"] {
            let opened = code.matches(&format!("{name}.create(")).count();
            let closed = code.matches(&format!("{name}.pop();")).count();
            assert_eq!(opened, closed, "{name} in {:?} mode:\n{code}", options.mode);
            assert!(opened > 0);
        }
    }
}

#[test]
fn test_branch_tags_in_source_order() {
    let unit = tree_unit();
    let code = lower(&unit, &LowerOptions::partial());
    let first = position(&code, "this.ifElseBranchUpdateFunction(0, () => {");
    let second = position(&code, "this.ifElseBranchUpdateFunction(1, () => {");
    assert!(first < second);
    assert_eq!(code, lower(&unit, &LowerOptions::partial()));

    let legacy = lower(&unit, &LowerOptions::legacy());
    assert!(position(&legacy, "If.branchId(0);") < position(&legacy, "If.branchId(1);"));
}

#[test]
fn test_conditional_without_else_gets_empty_branch() {
    let page = ComponentDecl::new("Maybe")
        .with_member(state("shown", TypeRef::Boolean, "false"))
        .with_build(vec![ConditionalBlock::new()
            .when("this.shown", vec![BuiltinInvocation::new("Text").arg("'x'").into()])
            .into()]);
    let code = lower(
        &SourceUnit::new("Maybe.ets").with_item(page),
        &LowerOptions::partial(),
    );
    assert!(code.contains("else {\n                    this.ifElseBranchUpdateFunction(1, () => {\n                    });"));
}

#[test]
fn test_lowered_statements_are_opaque() {
    let page = ComponentDecl::new("Again").with_build(vec![
        CompositionNode::statement("Column.create();"),
        CompositionNode::statement("Column.pop();"),
    ]);
    let code = lower(
        &SourceUnit::new("Again.ets").with_item(page),
        &LowerOptions::legacy(),
    );
    assert!(code.contains("    render() {\n        Column.create();\n        Column.pop();\n    }\n"));
}

#[test]
fn test_malformed_conditionals() {
    let text = || vec![BuiltinInvocation::new("Text").arg("'x'").into()];
    let cases = [
        (ConditionalBlock::new(), "conditional block without branches"),
        (
            ConditionalBlock::new()
                .when("this.a", text())
                .otherwise(text())
                .otherwise(text()),
            "conditional block has two else branches",
        ),
        (
            ConditionalBlock::new().otherwise(text()).when("this.a", text()),
            "else branch is followed by further branches",
        ),
    ];
    for (block, detail) in cases {
        let page = ComponentDecl::new("Page")
            .with_member(state("a", TypeRef::Boolean, "true"))
            .with_build(vec![block.into()]);
        let unit = SourceUnit::new("Page.ets").with_item(page);
        for options in [LowerOptions::legacy(), LowerOptions::partial()] {
            let errors = lower_unit(&unit, &options).unwrap_err();
            assert_eq!(
                errors[0].kind,
                LowerErrorKind::StructuralImbalance {
                    detail: detail.into()
                }
            );
        }
    }
}

fn lazy_unit() -> SourceUnit {
    let page = ComponentDecl::new("Feed").with_build(vec![BuiltinInvocation::new("List")
        .child(IterationBlock::lazy(vec![
            IterationArg::expr("this.data"),
            IterationArg::generator(
                ["item"],
                vec![BuiltinInvocation::new("Text").arg("item.title").into()],
            ),
            IterationArg::expr("item => item.id"),
        ]))
        .into()]);
    SourceUnit::new("Feed.ets").with_item(page)
}

#[test]
fn test_lazy_for_each_partial() {
    let code = lower(&lazy_unit(), &LowerOptions::partial());
    let generator = position(&code, "const __lazyForEachItemGenFunction = _item => {");
    let item = position(&code, "const item = _item;");
    let key = position(&code, "const __lazyForEachItemIdFunc = item => item.id;");
    let create = position(
        &code,
        "LazyForEach.create(\"3\", this, this.data, __lazyForEachItemGenFunction, __lazyForEachItemIdFunc);",
    );
    let pop = position(&code, "LazyForEach.pop();");
    assert!(generator < item && item < key && key < create && create < pop, "{code}");
    assert!(!code.contains("forEachUpdateFunction"));
}

#[test]
fn test_lazy_for_each_legacy() {
    let code = lower(&lazy_unit(), &LowerOptions::legacy());
    let create = position(&code, "LazyForEach.create(\"3\", this, this.data, item => {");
    let text = position(&code, "Text.create(item.title);");
    let key = position(&code, "}, item => item.id);");
    let pop = position(&code, "LazyForEach.pop();");
    assert!(create < text && text < key && key < pop, "{code}");
    assert!(!code.contains("GetRawObject"));
}

fn nested_iteration_unit() -> SourceUnit {
    let inner = |source: &str, item: &str| {
        IterationBlock::for_each(vec![
            IterationArg::expr(source),
            IterationArg::generator([item], vec![BuiltinInvocation::new("Text").arg(item).into()]),
            IterationArg::expr(format!("{item} => {item}")),
        ])
    };
    let page = ComponentDecl::new("Groups")
        .with_member(state("groups", TypeRef::Array(Box::new(TypeRef::named("Group"))), "[]"))
        .with_build(vec![IterationBlock::for_each(vec![
            IterationArg::expr("this.groups"),
            IterationArg::generator(
                ["group"],
                vec![
                    inner("group.items", "item").into(),
                    ConditionalBlock::new()
                        .when("group.open", vec![inner("group.tags", "tag").into()])
                        .into(),
                ],
            ),
            IterationArg::expr("group => group.id"),
        ])
        .into()]);
    SourceUnit::new("Groups.ets").with_item(page)
}

#[test]
fn test_nested_iteration_partial() {
    let code = lower(&nested_iteration_unit(), &LowerOptions::partial());
    assert_eq!(code.matches("ForEach.create();").count(), 3);
    assert_eq!(code.matches("ForEach.pop();").count(), 3);
    let outer = position(&code, "const group = _item;");
    let items = position(&code, "const item = _item;");
    let branch = position(&code, "if (group.open) {");
    let tags = position(&code, "const tag = _item;");
    assert!(outer < items && items < branch && branch < tags, "{code}");
    assert!(code.contains(
        "this.forEachUpdateFunction(elmtId, group.items, forEachItemGenFunction, item => item, false, false);"
    ));
    assert!(code.contains(
        "this.forEachUpdateFunction(elmtId, group.tags, forEachItemGenFunction, tag => tag, false, false);"
    ));
    assert!(code.contains(
        "this.forEachUpdateFunction(elmtId, this.groups, forEachItemGenFunction, group => group.id, false, false);"
    ));
}

#[test]
fn test_nested_iteration_legacy_ids() {
    let code = lower(&nested_iteration_unit(), &LowerOptions::legacy());
    let outer = position(
        &code,
        "ForEach.create(\"2\", this, ObservedObject.GetRawObject(this.groups), group => {",
    );
    let items = position(
        &code,
        "ForEach.create(\"3\", this, ObservedObject.GetRawObject(group.items), item => {",
    );
    let tags = position(
        &code,
        "ForEach.create(\"6\", this, ObservedObject.GetRawObject(group.tags), tag => {",
    );
    assert!(outer < items && items < tags, "{code}");
    assert_eq!(code.matches("ForEach.pop();").count(), 3);
}

#[test]
fn test_plain_member_identity() {
    let page = ComponentDecl::new("Plain")
        .with_member(MemberDecl::property("title", Some(TypeRef::String), Some("'hi'")));
    let code = lower(
        &SourceUnit::new("Plain.ets").with_item(page),
        &LowerOptions::partial(),
    );
    assert!(code.contains("this.title = 'hi';"));
    assert!(code.contains("if (params.title !== undefined) {\n            this.title = params.title;\n        }"));
    assert!(!code.contains("__title"));
}

#[test]
fn test_wrapper_family_follows_type() {
    let color = EnumDecl {
        name: "Mode".into(),
        members: vec![EnumMember {
            name: "Dark".into(),
            value: None,
        }],
        span: Default::default(),
    };
    let page = ComponentDecl::new("Kinds")
        .with_member(state("mode", TypeRef::named("Mode"), "Mode.Dark"))
        .with_member(state("items", TypeRef::Array(Box::new(TypeRef::Number)), "[]"))
        .with_member(state(
            "label",
            TypeRef::Union(vec![TypeRef::String, TypeRef::Undefined]),
            "undefined",
        ));
    let unit = SourceUnit::new("Kinds.ets").with_item(color).with_item(page);
    let code = lower(&unit, &LowerOptions::partial());
    assert!(code.contains("this.__mode = new ObservedPropertySimplePU(Mode.Dark, this, \"mode\");"));
    assert!(code.contains("this.__items = new ObservedPropertyObjectPU([], this, \"items\");"));
    assert!(code.contains("this.__label = new ObservedPropertySimplePU(undefined, this, \"label\");"));
    assert!(position(&code, "var Mode;") < position(&code, "class Kinds extends ViewPU"));
}

// ============================================================================
// CLASS SHAPES
// ============================================================================

#[test]
fn test_minimal_legacy_module() {
    let page = ComponentDecl::new("Hello")
        .with_build(vec![BuiltinInvocation::new("Text").arg("\"hi\"").into()]);
    let code = lower(
        &SourceUnit::new("pages/Hello.ets").with_item(page),
        &LowerOptions::legacy(),
    );
    insta::assert_snapshot!(code, @r#"
    "use strict";
    let __generate__Id = 0;
    function generateId() {
        return "Hello_" + ++__generate__Id;
    }
    class Hello extends View {
        constructor(compilerAssignedUniqueChildId, parent, params, localStorage) {
            super(compilerAssignedUniqueChildId, parent, localStorage);
            this.updateWithValueParams(params);
        }
        updateWithValueParams(params) {
        }
        aboutToBeDeleted() {
            SubscriberManager.Get().delete(this.id());
        }
        render() {
            Text.create("hi");
            Text.pop();
        }
    }
    "#);
}

#[test]
fn test_partial_lifecycle_order() {
    let code = lower(&counter_unit(), &LowerOptions::partial());
    let order = [
        "if (!(\"finalizeConstruction\" in ViewPU.prototype)) {",
        "class Counter extends ViewPU {",
        "constructor(parent, params, __localStorage, elmtId = -1, paramsLambda = undefined, extraInfo) {",
        "super(parent, __localStorage, elmtId, extraInfo);",
        "this.paramsGenerator_ = paramsLambda;",
        "this.setInitiallyProvidedValue(params);",
        "this.finalizeConstruction();",
        "setInitiallyProvidedValue(params) {",
        "updateStateVars(params) {",
        "purgeVariableDependenciesOnElmtId(rmElmtId) {",
        "aboutToBeDeleted() {",
        "SubscriberManager.Get().delete(this.id__());",
        "this.aboutToBeDeletedInternal();",
        "get count() {",
        "initialRender() {",
        "rerender() {",
        "this.updateDirtyElements();",
    ];
    let positions: Vec<_> = order.iter().map(|needle| position(&code, needle)).collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]), "{code}");
    assert_eq!(
        code.matches("PUV2ViewBase.contextStack && PUV2ViewBase.contextStack.push(this);").count(),
        2
    );
    assert!(!code.contains("getEntryName"));
}

#[test]
fn test_legacy_child_ids() {
    let child = ComponentDecl::new("Child").with_member(
        MemberDecl::property("count", Some(TypeRef::Number), None)
            .with_decorator(Decorator::new("Prop")),
    );
    let parent = ComponentDecl::new("Parent")
        .with_member(state("count", TypeRef::Number, "0"))
        .with_build(vec![BuiltinInvocation::new("Column")
            .child(ComponentInvocation::new("Child").prop("count", "this.count"))
            .into()]);
    let unit = SourceUnit::new("Parent.ets").with_item(child).with_item(parent);
    let code = lower(&unit, &LowerOptions::legacy());
    assert!(code.contains(
        "let earlierCreatedChild_3 = (this && this.findChildById) ? this.findChildById(\"3\") : undefined;"
    ));
    assert!(code.contains("View.create(new Child(\"3\", this, { count: this.count }));"));
    assert!(code.contains("earlierCreatedChild_3.updateWithValueParams({ count: this.count });"));
    assert!(code.contains("this.__count = new SynchedPropertySimpleOneWay(params.count, this, \"count\");"));

    let update = position(&code, "earlierCreatedChild_3.updateWithValueParams(");
    let guard = position(&code, "if (!earlierCreatedChild_3.needsUpdate()) {");
    let mark = position(&code, "earlierCreatedChild_3.markStatic();");
    let reuse = position(&code, "View.create(earlierCreatedChild_3);");
    assert!(update < guard && guard < mark && mark < reuse, "{code}");
}

#[test]
fn test_partial_child_creation() {
    let child = ComponentDecl::new("Child")
        .with_member(
            MemberDecl::property("count", Some(TypeRef::Number), None)
                .with_decorator(Decorator::new("Link")),
        )
        .with_member(MemberDecl::property("label", Some(TypeRef::String), Some("''")));
    let parent = ComponentDecl::new("Parent")
        .with_member(state("count", TypeRef::Number, "0"))
        .with_build(vec![ComponentInvocation::new("Child")
            .prop("count", "this.count")
            .prop("label", "'x'")
            .attr("width", ["100"])
            .into()]);
    let unit = SourceUnit::new("Parent.ets").with_item(child).with_item(parent);
    let options = LowerOptions {
        extra_info: false,
        ..LowerOptions::partial()
    };
    let code = lower(&unit, &options);
    assert!(code.contains("__Common__.create();"));
    assert!(code.contains("__Common__.width(100);"));
    assert!(code.contains(
        "let componentCall = new Child(this, { count: this.__count, label: 'x' }, undefined, elmtId);"
    ));
    assert!(code.contains("this.updateStateVarsOfChildByElmtId(elmtId, { label: 'x' });"));
    assert!(code.contains("}, { name: \"Child\" });"));
    assert!(position(&code, "}, { name: \"Child\" });") < position(&code, "__Common__.pop();"));
}

#[test]
fn test_link_argument_shorthand() {
    let child = ComponentDecl::new("Child").with_member(
        MemberDecl::property("count", Some(TypeRef::Number), None)
            .with_decorator(Decorator::new("Link")),
    );
    let parent = ComponentDecl::new("Parent")
        .with_member(state("count", TypeRef::Number, "0"))
        .with_build(vec![ComponentInvocation::new("Child").prop("count", "$count").into()]);
    let unit = SourceUnit::new("Parent.ets").with_item(child).with_item(parent);
    let code = lower(&unit, &LowerOptions::legacy());
    assert!(code.contains("new Child(\"2\", this, { count: this.__count })"));
    assert!(code.contains("earlierCreatedChild_2.updateWithValueParams({});"));
}

#[test]
fn test_link_argument_must_name_wrapped_member() {
    let child = ComponentDecl::new("Child").with_member(
        MemberDecl::property("value", Some(TypeRef::Number), None)
            .with_decorator(Decorator::new("Link")),
    );
    for (argument, name) in [("$ghost", "$ghost"), ("$plain", "$plain")] {
        let parent = ComponentDecl::new("Parent")
            .with_member(MemberDecl::property("plain", Some(TypeRef::Number), Some("1")))
            .with_build(vec![ComponentInvocation::new("Child").prop("value", argument).into()]);
        let unit = SourceUnit::new("Parent.ets")
            .with_item(child.clone())
            .with_item(parent);
        let errors = lower_unit(&unit, &LowerOptions::partial()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].kind,
            LowerErrorKind::UnresolvedBinding { name: name.into() }
        );
    }
}

#[test]
fn test_custom_dialog_controller() {
    let dialog = ComponentDecl {
        decorators: vec![Decorator::new("CustomDialog")],
        ..ComponentDecl::new("Confirm")
    }
    .with_member(MemberDecl::property(
        "controller",
        Some(TypeRef::named("CustomDialogController")),
        None,
    ));
    let code = lower(
        &SourceUnit::new("Confirm.ets").with_item(dialog),
        &LowerOptions::partial(),
    );
    assert!(code.contains("    setController(ctr) {\n        this.controller = ctr;\n    }"));
}

#[test]
fn test_methods_and_statics_carried_over() {
    let page = ComponentDecl::new("Page")
        .with_member(MemberDecl::method(
            "aboutToAppear",
            Vec::new(),
            MethodBody::Statements(vec![Verbatim::new("console.info('hi');")]),
        ))
        .with_member(MemberDecl::getter(
            "double",
            vec![Verbatim::new("return 2;")],
        ))
        .with_member(MemberDecl {
            is_static: true,
            ..MemberDecl::property("shared", Some(TypeRef::Number), Some("1"))
        });
    let code = lower(
        &SourceUnit::new("Page.ets").with_item(page),
        &LowerOptions::partial(),
    );
    assert!(code.contains("    aboutToAppear() {\n        console.info('hi');\n    }"));
    assert!(code.contains("    get double() {\n        return 2;\n    }"));
    assert!(code.contains("\nPage.shared = 1;\n"));
    assert!(!code.contains("this.shared"));
}

// ============================================================================
// BUILDERS, STYLES AND EXTENDS
// ============================================================================

#[test]
fn test_trailing_closure_fills_builder_param() {
    let card = ComponentDecl::new("Card").with_member(
        MemberDecl::property("content", Some(TypeRef::Function), None)
            .with_decorator(Decorator::new("BuilderParam")),
    );
    let page = ComponentDecl::new("Page").with_build(vec![ComponentInvocation::new("Card")
        .trailing(vec![BuiltinInvocation::new("Text").arg("'inner'").into()])
        .into()]);
    let unit = SourceUnit::new("Page.ets").with_item(card).with_item(page);
    let code = lower(&unit, &LowerOptions::legacy());
    assert!(code.contains("new Card(\"2\", this, {\n"));
    assert!(code.contains("content: () => {\n"));
    assert!(code.contains("Text.create('inner');"));
}

#[test]
fn test_trailing_closure_without_target() {
    let page = ComponentDecl::new("Page").with_build(vec![ComponentInvocation::new("Elsewhere")
        .trailing(Vec::new())
        .into()]);
    let errors = lower_unit(
        &SourceUnit::new("Page.ets").with_item(page),
        &LowerOptions::partial(),
    )
    .unwrap_err();
    assert_eq!(
        errors[0].kind,
        LowerErrorKind::UnknownTrailingClosureTarget {
            component: "Elsewhere".into()
        }
    );
}

#[test]
fn test_builder_param_call_is_guarded() {
    let card = ComponentDecl::new("Card")
        .with_member(
            MemberDecl::property("content", Some(TypeRef::Function), None)
                .with_decorator(Decorator::new("BuilderParam")),
        )
        .with_build(vec![BuilderInvocation::method("content").into()]);
    let code = lower(
        &SourceUnit::new("Card.ets").with_item(card),
        &LowerOptions::partial(),
    );
    assert!(code.contains(
        "if (typeof this.content === \"function\") {\n                this.content.bind(this)();\n            }"
    ));
}

#[test]
fn test_global_builder_styles_and_extend() {
    let builder = FunctionDecl::new(
        "Title",
        vec![Param::new("label")],
        MethodBody::Composition(vec![BuiltinInvocation::new("Text").arg("label").into()]),
    )
    .with_decorator(Decorator::new("Builder"));
    let styles = FunctionDecl::new(
        "card",
        Vec::new(),
        MethodBody::Attributes(vec![AttributeCall::new("borderRadius", ["8"])]),
    )
    .with_decorator(Decorator::new("Styles"));
    let extend = FunctionDecl::new(
        "fancy",
        vec![Param::new("color")],
        MethodBody::Attributes(vec![AttributeCall::new("backgroundColor", ["color"])]),
    )
    .with_decorator(Decorator::new("Extend").with_arg("Button"));
    let page = ComponentDecl::new("Page").with_build(vec![
        BuiltinInvocation::new("Button")
            .arg("'ok'")
            .attr("card", Vec::<&str>::new())
            .attr("fancy", ["Color.Red"])
            .into(),
        BuilderInvocation::function("Title").arg("'hello'").into(),
    ]);
    let unit = SourceUnit::new("Page.ets")
        .with_item(builder)
        .with_item(styles)
        .with_item(extend)
        .with_item(page);
    let code = lower(&unit, &LowerOptions::partial());

    assert!(code.contains("function Title(label, parent = null) {"));
    assert!(code.contains("(parent ? parent : this).observeComponentCreation2("));
    assert!(code.contains("function __Button__fancy(color) {\n    Button.backgroundColor(color);\n}"));
    assert!(!code.contains("function card"));
    assert!(code.contains("Button.borderRadius(8);"));
    assert!(code.contains("__Button__fancy(Color.Red);"));
    assert!(code.contains("Title.bind(this)('hello');"));
}

#[test]
fn test_builder_taking_parameter_by_reference() {
    let page = ComponentDecl::new("Player")
        .with_member(state("count", TypeRef::Number, "0"))
        .with_member(
            MemberDecl::method(
                "bottom",
                vec![Param::new("$$")],
                MethodBody::Composition(vec![BuiltinInvocation::new("Text")
                    .arg("'Hello' + $$.count")
                    .into()]),
            )
            .with_decorator(Decorator::new("Builder")),
        )
        .with_build(vec![BuiltinInvocation::new("Column")
            .child(BuilderInvocation::method("bottom").arg("{ count: this.count }"))
            .child(BuilderInvocation::function("comp").arg("{ count: this.count }"))
            .into()]);
    let comp = FunctionDecl::new(
        "comp",
        vec![Param::new("$$")],
        MethodBody::Composition(vec![BuiltinInvocation::new("Text").arg("$$.count").into()]),
    )
    .with_decorator(Decorator::new("Builder"));
    let unit = SourceUnit::new("Player.ets").with_item(comp).with_item(page);
    let code = lower(&unit, &LowerOptions::partial());

    assert!(code.contains("    bottom($$, parent = null) {"));
    assert!(code.contains("Text.create('Hello' + $$.count);"));
    assert!(code.contains("function comp($$, parent = null) {"));
    assert!(code.contains("Text.create($$.count);"));
    assert!(code.contains(
        "this.bottom.bind(this)(makeBuilderParameterProxy(\"bottom\", { count: () => (this[\"__count\"] ? this[\"__count\"] : this[\"count\"]) }));"
    ));
    assert!(code.contains(
        "comp.bind(this)(makeBuilderParameterProxy(\"comp\", { count: () => (this[\"__count\"] ? this[\"__count\"] : this[\"count\"]) }));"
    ));
}

#[test]
fn test_local_builder_pushes_context() {
    let page = ComponentDecl::new("Page").with_member(
        MemberDecl::method(
            "row",
            Vec::new(),
            MethodBody::Composition(vec![BuiltinInvocation::new("Row").with_block().into()]),
        )
        .with_decorator(Decorator::new("LocalBuilder")),
    );
    let code = lower(
        &SourceUnit::new("Page.ets").with_item(page),
        &LowerOptions::partial(),
    );
    let method = position(&code, "    row(parent = null) {\n        PUV2ViewBase.contextStack && PUV2ViewBase.contextStack.push(this);\n        try {");
    assert!(position(&code, "initialRender() {") > method);
}

// ============================================================================
// ENTRY AND V2
// ============================================================================

#[test]
fn test_entry_startup_partial() {
    let page = ComponentDecl::new("Index")
        .with_decorator(Decorator::new("Entry"))
        .with_build(vec![BuiltinInvocation::new("Column").with_block().into()]);
    let code = lower(
        &SourceUnit::new("pages/Index.ets").with_item(page),
        &LowerOptions::partial(),
    );
    assert!(code.contains("    static getEntryName() {\n        return \"Index\";\n    }"));
    assert!(code.ends_with(
        "ViewStackProcessor.StartGetAccessRecordingFor(ViewStackProcessor.AllocateNewElmetIdForNextComponent());\n\
         loadDocument(new Index(undefined, {}));\n\
         ViewStackProcessor.StopGetAccessRecording();\n"
    ));
}

#[test]
fn test_named_route_uses_page_info() {
    let page = ComponentDecl::new("Index")
        .with_decorator(Decorator::new("Entry").with_arg("{ routeName: 'index' }"));
    let options = LowerOptions {
        route: RouteMode::NamedRoute,
        bundle_name: Some("com.example.app".into()),
        module_name: Some("entry".into()),
        ..LowerOptions::partial()
    };
    let code = lower(&SourceUnit::new("pages/Index.ets").with_item(page), &options);
    assert!(code.ends_with(
        "registerNamedRoute(() => new Index(undefined, {}), \"index\", { bundleName: \"com.example.app\", moduleName: \"entry\", pagePath: \"Index\" });\n"
    ));
}

#[test]
fn test_component_v2_forces_partial() {
    let card = ComponentDecl {
        decorators: vec![Decorator::new("ComponentV2")],
        ..ComponentDecl::new("Card")
    }
    .with_member(
        MemberDecl::property("title", Some(TypeRef::String), Some("''"))
            .with_decorator(Decorator::new("Param")),
    )
    .with_member(
        MemberDecl::property("count", Some(TypeRef::Number), Some("0"))
            .with_decorator(Decorator::new("Local")),
    );
    let unit = SourceUnit::new("Card.ets").with_item(card);

    let output = lower_unit(&unit, &LowerOptions::legacy()).unwrap();
    assert_eq!(output.mode, UpdateMode::Partial);
    assert_eq!(output.warnings.len(), 1);
    assert_eq!(output.warnings[0].code, DiagnosticCode::ModeOverride);

    let code = output.code;
    assert!(code.contains("var __decorate = (this && this.__decorate) || function"));
    assert!(code.contains("class Card extends ViewV2 {"));
    assert!(code.contains("super(parent, elmtId, extraInfo);"));
    assert!(code.contains(
        "this.initParam(\"title\", (params && \"title\" in params) ? params.title : '');"
    ));
    assert!(code.contains("this.count = 0;"));
    assert!(code.contains("if (\"title\" in params) {\n            this.updateParam(\"title\", params.title);\n        }"));
    assert!(code.contains("__decorate([Param], Card.prototype, \"title\", void 0);"));
    assert!(code.contains("__decorate([Local], Card.prototype, \"count\", void 0);"));
    assert!(!code.contains("__generate__Id"));
}
