use super::*;
use std::cell::RefCell;
use std::rc::Rc;

thread_local! {
    static LOG: RefCell<Vec<String>> = RefCell::new(Vec::new());
}

fn record(entry: impl Into<String>) {
    LOG.with(|log| log.borrow_mut().push(entry.into()));
}

fn take_log() -> Vec<String> {
    LOG.with(|log| std::mem::take(&mut *log.borrow_mut()))
}

fn setup() -> (Renderer<MemoryHost>, HostId) {
    take_log();
    let mut host = MemoryHost::new();
    let container = host.create_root();
    (Renderer::new(host, Runtime::default()), container)
}

/// A ref that captures a typed handle to the component it is attached to.
fn capture<C: Component>() -> (NodeRef, Rc<RefCell<Option<Handle<C>>>>) {
    let slot = Rc::new(RefCell::new(None));
    let sink = slot.clone();
    let node_ref = NodeRef::callback(move |target: Option<&RefTarget>| {
        if let Some(handle) = target
            .and_then(RefTarget::component)
            .and_then(ComponentRef::handle::<C>)
        {
            *sink.borrow_mut() = Some(handle);
        }
    });
    (node_ref, slot)
}

struct Parent;

impl Component for Parent {
    type State = ();

    fn create(_props: &Props, _context: &Context) -> Self {
        Parent
    }

    fn render(&self, _scope: &Scope<'_, Self>) -> Result<Descriptor, ComponentError> {
        record("render parent");
        Ok(element("div")
            .child(component::<Child>(Props::new()))
            .into())
    }

    fn will_mount(&mut self, _scope: &Scope<'_, Self>) -> Result<(), ComponentError> {
        record("will_mount parent");
        Ok(())
    }

    fn did_mount(&mut self, _scope: &Scope<'_, Self>) -> Result<(), ComponentError> {
        record("did_mount parent");
        Ok(())
    }

    fn will_unmount(&mut self, _scope: &Scope<'_, Self>) -> Result<(), ComponentError> {
        record("will_unmount parent");
        Ok(())
    }
}

struct Child;

impl Component for Child {
    type State = ();

    fn create(_props: &Props, _context: &Context) -> Self {
        Child
    }

    fn render(&self, _scope: &Scope<'_, Self>) -> Result<Descriptor, ComponentError> {
        record("render child");
        Ok(text("leaf"))
    }

    fn will_mount(&mut self, _scope: &Scope<'_, Self>) -> Result<(), ComponentError> {
        record("will_mount child");
        Ok(())
    }

    fn did_mount(&mut self, _scope: &Scope<'_, Self>) -> Result<(), ComponentError> {
        record("did_mount child");
        Ok(())
    }

    fn will_unmount(&mut self, _scope: &Scope<'_, Self>) -> Result<(), ComponentError> {
        record("will_unmount child");
        Ok(())
    }
}

#[derive(Clone, Default)]
struct CounterState {
    count: i64,
    history: Vec<&'static str>,
}

struct Counter;

impl Component for Counter {
    type State = CounterState;

    fn create(_props: &Props, _context: &Context) -> Self {
        Counter
    }

    fn render(&self, scope: &Scope<'_, Self>) -> Result<Descriptor, ComponentError> {
        record(format!(
            "render {}",
            scope.props().str("label").unwrap_or("counter")
        ));
        Ok(element("span")
            .text(scope.state().count.to_string())
            .into())
    }
}

struct Frozen;

impl Component for Frozen {
    type State = ();

    fn create(_props: &Props, _context: &Context) -> Self {
        Frozen
    }

    fn render(&self, scope: &Scope<'_, Self>) -> Result<Descriptor, ComponentError> {
        Ok(element("em")
            .text(scope.props().str("label").unwrap_or_default())
            .into())
    }

    fn should_update(
        &self,
        _next_props: &Props,
        _next_state: &(),
        _next_context: &Context,
        _scope: &Scope<'_, Self>,
    ) -> bool {
        false
    }
}

#[derive(Clone, Default)]
struct EchoState {
    received: usize,
}

struct Echo;

impl Component for Echo {
    type State = EchoState;

    fn create(_props: &Props, _context: &Context) -> Self {
        Echo
    }

    fn render(&self, scope: &Scope<'_, Self>) -> Result<Descriptor, ComponentError> {
        let label = scope.props().str("label").unwrap_or_default();
        Ok(text(format!("{label}:{}", scope.state().received)))
    }

    fn will_receive_props(
        &mut self,
        next_props: &Props,
        _next_context: &Context,
        scope: &Scope<'_, Self>,
    ) -> Result<(), ComponentError> {
        record(format!(
            "receive {}",
            next_props.str("label").unwrap_or_default()
        ));
        scope.handle().set_state(|state| state.received += 1);
        Ok(())
    }
}

/// Re-renders the same child descriptor, so the child sees identical props.
struct Holder {
    child: Descriptor,
}

impl Component for Holder {
    type State = usize;

    fn create(_props: &Props, _context: &Context) -> Self {
        Holder {
            child: component::<Echo>(Props::new().with("label", "kept")).into(),
        }
    }

    fn render(&self, scope: &Scope<'_, Self>) -> Result<Descriptor, ComponentError> {
        Ok(element("div")
            .child(self.child.clone())
            .child(text(scope.state().to_string()))
            .into())
    }
}

struct Provider;

impl Component for Provider {
    type State = ();

    fn create(_props: &Props, _context: &Context) -> Self {
        Provider
    }

    fn render(&self, _scope: &Scope<'_, Self>) -> Result<Descriptor, ComponentError> {
        Ok(element("main")
            .child(component::<Consumer>(Props::new()))
            .into())
    }

    fn child_context(&self, scope: &Scope<'_, Self>) -> Option<Props> {
        let theme = scope.props().str("theme").unwrap_or("light");
        Some(Props::new().with("theme", theme))
    }
}

struct Consumer;

impl Component for Consumer {
    type State = ();

    fn create(_props: &Props, _context: &Context) -> Self {
        Consumer
    }

    fn render(&self, scope: &Scope<'_, Self>) -> Result<Descriptor, ComponentError> {
        let theme = scope
            .context()
            .get("theme")
            .and_then(PropValue::as_str)
            .unwrap_or("none");
        Ok(text(theme))
    }
}

struct Broken;

impl Component for Broken {
    type State = ();

    fn create(_props: &Props, _context: &Context) -> Self {
        Broken
    }

    fn render(&self, _scope: &Scope<'_, Self>) -> Result<Descriptor, ComponentError> {
        Err(ComponentError::new("boom"))
    }
}

#[derive(Clone, Default)]
struct BoundaryState {
    error: Option<String>,
}

struct Boundary;

impl Component for Boundary {
    type State = BoundaryState;

    fn create(_props: &Props, _context: &Context) -> Self {
        Boundary
    }

    fn render(&self, scope: &Scope<'_, Self>) -> Result<Descriptor, ComponentError> {
        Ok(match &scope.state().error {
            Some(message) => element("p").text(format!("caught: {message}")).into(),
            None => element("section")
                .children(scope.children().to_vec())
                .into(),
        })
    }

    fn catches_errors(&self) -> bool {
        true
    }

    fn did_catch(&mut self, error: &ComponentError, scope: &Scope<'_, Self>) {
        let message = error.message().to_string();
        scope.handle().set_state(move |state| state.error = Some(message));
    }
}

#[derive(Clone, Default)]
struct FlakyState {
    failing: bool,
}

struct Flaky;

impl Component for Flaky {
    type State = FlakyState;

    fn create(_props: &Props, _context: &Context) -> Self {
        Flaky
    }

    fn render(&self, scope: &Scope<'_, Self>) -> Result<Descriptor, ComponentError> {
        if scope.state().failing {
            return Err(ComponentError::new("late failure"));
        }
        Ok(text("fine"))
    }
}

struct Form;

impl Component for Form {
    type State = ();

    fn create(_props: &Props, _context: &Context) -> Self {
        Form
    }

    fn render(&self, _scope: &Scope<'_, Self>) -> Result<Descriptor, ComponentError> {
        Ok(element("form")
            .child(element("input").node_ref(NodeRef::named("field")))
            .into())
    }

    fn did_mount(&mut self, scope: &Scope<'_, Self>) -> Result<(), ComponentError> {
        let bound = scope.named_ref("field").and_then(|target| target.host_id());
        record(format!("field bound: {}", bound.is_some()));
        Ok(())
    }
}

/// Re-renders only when its props or state shallowly change.
struct Chip;

impl Component for Chip {
    type State = i64;

    fn create(_props: &Props, _context: &Context) -> Self {
        Chip
    }

    fn render(&self, scope: &Scope<'_, Self>) -> Result<Descriptor, ComponentError> {
        record("render chip");
        let label = scope.props().str("label").unwrap_or_default();
        Ok(element("span")
            .text(format!("{label}:{}", scope.state()))
            .into())
    }

    crate::pure_component!();
}

fn badge(props: &Props, _context: &Context) -> Result<Descriptor, ComponentError> {
    record("render badge");
    Ok(element("b")
        .text(props.str("name").unwrap_or_default())
        .into())
}

fn name_changed(previous: &Props, next: &Props) -> bool {
    previous.str("name") != next.str("name")
}

fn failing(_props: &Props, _context: &Context) -> Result<Descriptor, ComponentError> {
    Err(ComponentError::new("bad input"))
}

#[test]
fn did_mount_runs_children_first() {
    let (mut renderer, container) = setup();
    renderer
        .render(component::<Parent>(Props::new()), container)
        .unwrap();

    assert_eq!(
        take_log(),
        [
            "will_mount parent",
            "render parent",
            "will_mount child",
            "render child",
            "did_mount child",
            "did_mount parent",
        ]
    );
    assert_eq!(renderer.host().text_content(container), "leaf");
}

#[test]
fn unmount_runs_parents_first() {
    let (mut renderer, container) = setup();
    renderer
        .render(component::<Parent>(Props::new()), container)
        .unwrap();
    take_log();

    renderer.unmount(container).unwrap();

    assert_eq!(take_log(), ["will_unmount parent", "will_unmount child"]);
    assert!(renderer.host().children(container).is_empty());
}

#[test]
fn state_updates_are_batched_in_request_order() {
    let (mut renderer, container) = setup();
    let (node_ref, slot) = capture::<Counter>();
    let root = renderer
        .render(component::<Counter>(Props::new()).node_ref(node_ref), container)
        .unwrap();
    let handle = slot.borrow().clone().unwrap();
    take_log();

    handle.set_state(|state| {
        state.count += 1;
        state.history.push("first");
    });
    handle.set_state(|state| {
        state.count *= 10;
        state.history.push("second");
    });
    assert_eq!(renderer.runtime().pending_len(), 1);

    assert_eq!(renderer.flush().unwrap(), 1);
    assert_eq!(take_log(), ["render counter"]);
    assert_eq!(
        handle.with_state(|state| (state.count, state.history.clone())),
        Some((10, vec!["first", "second"]))
    );
    assert_eq!(renderer.host().text_content(root), "10");
    assert!(!renderer.runtime().has_pending());
}

#[test]
fn derived_updates_read_committed_state() {
    let (mut renderer, container) = setup();
    let (node_ref, slot) = capture::<Counter>();
    renderer
        .render(
            component::<Counter>(Props::new().with("step", 5)).node_ref(node_ref),
            container,
        )
        .unwrap();
    let handle = slot.borrow().clone().unwrap();

    for _ in 0..2 {
        handle.update_state(|committed, props, next| {
            next.count = committed.count + props.int("step").unwrap_or(1);
        });
    }
    renderer.flush().unwrap();

    assert_eq!(handle.with_state(|state| state.count), Some(5));
}

#[test]
fn flush_runs_latest_request_first() {
    let (mut renderer, container) = setup();
    let (ref_a, slot_a) = capture::<Counter>();
    let (ref_b, slot_b) = capture::<Counter>();
    renderer
        .render(
            element("div").children([
                component::<Counter>(Props::new().with("label", "a")).node_ref(ref_a),
                component::<Counter>(Props::new().with("label", "b")).node_ref(ref_b),
            ]),
            container,
        )
        .unwrap();
    let a = slot_a.borrow().clone().unwrap();
    let b = slot_b.borrow().clone().unwrap();
    take_log();

    a.set_state(|state| state.count += 1);
    b.set_state(|state| state.count += 2);

    assert_eq!(renderer.flush().unwrap(), 2);
    assert_eq!(take_log(), ["render b", "render a"]);
    assert_eq!(renderer.host().text_content(container), "12");
}

#[test]
fn commit_callbacks_run_most_recent_first() {
    let (mut renderer, container) = setup();
    let (node_ref, slot) = capture::<Counter>();
    renderer
        .render(component::<Counter>(Props::new()).node_ref(node_ref), container)
        .unwrap();
    let handle = slot.borrow().clone().unwrap();
    take_log();

    handle.set_state_with(|state| state.count += 1, || record("first"));
    handle.set_state_with(|state| state.count += 1, || record("second"));
    renderer.flush().unwrap();

    assert_eq!(take_log(), ["render counter", "second", "first"]);
}

#[test]
fn rejected_update_commits_without_touching_host() {
    let (mut renderer, container) = setup();
    let (node_ref, slot) = capture::<Frozen>();
    let root = renderer
        .render(
            component::<Frozen>(Props::new().with("label", "one")).node_ref(node_ref.clone()),
            container,
        )
        .unwrap();
    let handle = slot.borrow().clone().unwrap();
    renderer.host_mut().reset_mutations();

    renderer
        .render(
            component::<Frozen>(Props::new().with("label", "two")).node_ref(node_ref),
            container,
        )
        .unwrap();

    assert_eq!(renderer.host().mutation_count(), 0);
    assert_eq!(renderer.host().text_content(root), "one");
    assert_eq!(
        handle.with_props(|props| props.str("label").map(str::to_string)),
        Some(Some("two".to_string()))
    );

    handle.force_update();
    assert_eq!(renderer.flush().unwrap(), 1);
    assert_eq!(renderer.host().text_content(root), "two");
}

#[test]
fn new_props_trigger_will_receive_props() {
    let (mut renderer, container) = setup();
    renderer
        .render(component::<Echo>(Props::new().with("label", "a")), container)
        .unwrap();
    assert_eq!(renderer.host().text_content(container), "a:0");

    renderer
        .render(component::<Echo>(Props::new().with("label", "b")), container)
        .unwrap();

    assert_eq!(take_log(), ["receive b"]);
    assert_eq!(renderer.host().text_content(container), "b:1");
    assert!(!renderer.runtime().has_pending());
}

#[test]
fn identical_props_skip_will_receive_props() {
    let (mut renderer, container) = setup();
    let (node_ref, slot) = capture::<Holder>();
    renderer
        .render(component::<Holder>(Props::new()).node_ref(node_ref), container)
        .unwrap();
    let handle = slot.borrow().clone().unwrap();

    handle.set_state(|ticks| *ticks += 1);
    assert_eq!(renderer.flush().unwrap(), 1);

    assert!(take_log().is_empty());
    assert_eq!(renderer.host().text_content(container), "kept:01");
}

#[test]
fn child_context_reaches_descendants() {
    let (mut renderer, container) = setup();
    renderer
        .render(component::<Provider>(Props::new()), container)
        .unwrap();
    assert_eq!(renderer.host().text_content(container), "light");

    renderer
        .render(
            component::<Provider>(Props::new().with("theme", "dark")),
            container,
        )
        .unwrap();
    assert_eq!(renderer.host().text_content(container), "dark");
}

#[test]
fn boundary_recovers_from_descendant_error() {
    let (mut renderer, container) = setup();
    renderer
        .render(
            component::<Boundary>(Props::new()).children([component::<Broken>(Props::new())]),
            container,
        )
        .unwrap();
    assert_eq!(renderer.runtime().pending_len(), 1);

    renderer.flush().unwrap();

    assert_eq!(renderer.host().text_content(container), "caught: boom");
}

#[test]
fn boundary_recovers_from_stateless_error() {
    let (mut renderer, container) = setup();
    renderer
        .render(
            component::<Boundary>(Props::new()).children([stateless(failing, Props::new())]),
            container,
        )
        .unwrap();
    renderer.flush().unwrap();

    assert_eq!(renderer.host().text_content(container), "caught: bad input");
}

#[test]
fn unhandled_render_error_reaches_caller() {
    let (mut renderer, container) = setup();
    let error = renderer
        .render(
            element("div").child(component::<Broken>(Props::new())),
            container,
        )
        .unwrap_err();

    assert_eq!(
        error,
        RenderError::Unhandled {
            component: "Broken",
            error: ComponentError::new("boom"),
        }
    );
    assert!(renderer.root(container).is_none());
    assert!(renderer.host().children(container).is_empty());
}

#[test]
fn unhandled_stateless_error_names_stateless_component() {
    let (mut renderer, container) = setup();
    let error = renderer
        .render(stateless(failing, Props::new()), container)
        .unwrap_err();
    assert!(matches!(
        error,
        RenderError::Unhandled {
            component: "stateless component",
            ..
        }
    ));
}

#[test]
fn update_error_reaches_flush_caller() {
    let (mut renderer, container) = setup();
    let (node_ref, slot) = capture::<Flaky>();
    renderer
        .render(component::<Flaky>(Props::new()).node_ref(node_ref), container)
        .unwrap();
    let handle = slot.borrow().clone().unwrap();

    handle.set_state(|state| state.failing = true);

    assert_eq!(
        renderer.flush().unwrap_err(),
        RenderError::Unhandled {
            component: "Flaky",
            error: ComponentError::new("late failure"),
        }
    );
}

#[test]
fn unmounted_component_is_skipped_by_flush() {
    let (mut renderer, container) = setup();
    let (node_ref, slot) = capture::<Counter>();
    renderer
        .render(component::<Counter>(Props::new()).node_ref(node_ref), container)
        .unwrap();
    let handle = slot.borrow().clone().unwrap();

    handle.set_state(|state| state.count = 7);
    renderer.unmount(container).unwrap();

    assert!(!handle.is_mounted());
    assert_eq!(renderer.flush().unwrap(), 0);
}

#[test]
fn handle_reports_root_host() {
    let (mut renderer, container) = setup();
    let (node_ref, slot) = capture::<Counter>();
    let root = renderer
        .render(component::<Counter>(Props::new()).node_ref(node_ref), container)
        .unwrap();
    let handle = slot.borrow().clone().unwrap();

    assert!(handle.is_mounted());
    assert_eq!(handle.host(), Some(root));
}

#[test]
fn named_ref_resolves_against_owner() {
    let (mut renderer, container) = setup();
    let (node_ref, slot) = capture::<Form>();
    let root = renderer
        .render(component::<Form>(Props::new()).node_ref(node_ref), container)
        .unwrap();
    let handle = slot.borrow().clone().unwrap();
    let input = renderer.host().children(root)[0];

    assert_eq!(take_log(), ["field bound: true"]);
    assert_eq!(
        handle.named_ref("field").and_then(|target| target.host_id()),
        Some(input)
    );

    renderer.unmount(container).unwrap();
    assert!(handle.named_ref("field").is_none());
}

#[test]
fn stateless_guard_skips_rerender() {
    let (mut renderer, container) = setup();
    let badge_for = |name: &str, title: &str| {
        stateless(badge, Props::new().with("name", name).with("title", title))
            .should_update(name_changed)
    };
    renderer.render(badge_for("ada", "x"), container).unwrap();
    renderer.render(badge_for("ada", "y"), container).unwrap();
    assert_eq!(take_log(), ["render badge"]);

    renderer.render(badge_for("grace", "y"), container).unwrap();
    assert_eq!(take_log(), ["render badge"]);
    assert_eq!(renderer.host().text_content(container), "grace");
}

#[test]
fn lifecycle_hooks_observe_components() {
    let mut host = MemoryHost::new();
    let container = host.create_root();
    let options = RenderOptions::new()
        .after_mount(|info| record(format!("mounted {} {:?}", info.name, info.kind)))
        .after_update(|info| record(format!("updated {}", info.name)))
        .before_unmount(|info| record(format!("unmounting {}", info.name)));
    let mut renderer = Renderer::with_options(host, Runtime::default(), options);
    take_log();
    let (node_ref, slot) = capture::<Counter>();

    renderer
        .render(component::<Counter>(Props::new()).node_ref(node_ref), container)
        .unwrap();
    let handle = slot.borrow().clone().unwrap();
    handle.set_state(|state| state.count += 1);
    renderer.flush().unwrap();
    renderer.unmount(container).unwrap();

    let observed: Vec<String> = take_log()
        .into_iter()
        .filter(|entry| !entry.starts_with("render"))
        .collect();
    assert_eq!(
        observed,
        [
            "mounted Counter Composite",
            "updated Counter",
            "unmounting Counter",
        ]
    );
}

#[test]
fn renderer_force_update_bypasses_guard_synchronously() {
    let (mut renderer, container) = setup();
    let (node_ref, slot) = capture::<Frozen>();
    let frozen = |label: &str| component::<Frozen>(Props::new().with("label", label));
    renderer
        .render(frozen("one").node_ref(node_ref.clone()), container)
        .unwrap();
    renderer
        .render(frozen("two").node_ref(node_ref), container)
        .unwrap();
    assert_eq!(renderer.host().text_content(container), "one");

    let handle = slot.borrow().clone().unwrap();
    let target = handle.component_ref().unwrap();
    renderer.force_update(&target).unwrap();

    assert_eq!(renderer.host().text_content(container), "two");
    assert!(!renderer.runtime().has_pending());
}

#[test]
fn renderer_force_update_runs_callback_after_commit() {
    let (mut renderer, container) = setup();
    let (node_ref, slot) = capture::<Counter>();
    renderer
        .render(component::<Counter>(Props::new()).node_ref(node_ref), container)
        .unwrap();
    let handle = slot.borrow().clone().unwrap();
    take_log();

    let target = handle.component_ref().unwrap();
    renderer
        .force_update_with(&target, || record("forced"))
        .unwrap();

    let log = take_log();
    assert_eq!(log.last().map(String::as_str), Some("forced"));
    assert!(log.iter().any(|entry| entry.starts_with("render")));
}

#[test]
fn force_update_of_unmounted_component_fails() {
    let (mut renderer, container) = setup();
    let (node_ref, slot) = capture::<Counter>();
    renderer
        .render(component::<Counter>(Props::new()).node_ref(node_ref), container)
        .unwrap();
    let target = slot.borrow().clone().unwrap().component_ref().unwrap();
    renderer.unmount(container).unwrap();

    assert!(renderer.force_update(&target).is_err());
}

#[test]
fn deferred_force_update_waits_for_flush() {
    let (mut renderer, container) = setup();
    let (node_ref, slot) = capture::<Frozen>();
    let frozen = |label: &str| component::<Frozen>(Props::new().with("label", label));
    renderer
        .render(frozen("one").node_ref(node_ref.clone()), container)
        .unwrap();
    renderer
        .render(frozen("two").node_ref(node_ref), container)
        .unwrap();
    let handle = slot.borrow().clone().unwrap();

    handle.force_update_with(|| record("forced"));
    assert_eq!(renderer.host().text_content(container), "one");

    assert_eq!(renderer.flush().unwrap(), 1);
    assert_eq!(renderer.host().text_content(container), "two");
    assert_eq!(take_log(), ["forced"]);
}

#[test]
fn pure_component_skips_equal_props_and_state() {
    let (mut renderer, container) = setup();
    let (node_ref, slot) = capture::<Chip>();
    let chip = |label: &str| {
        component::<Chip>(Props::new().with("label", label).with("size", 2))
    };
    renderer
        .render(chip("new").node_ref(node_ref.clone()), container)
        .unwrap();
    assert_eq!(take_log(), ["render chip"]);

    renderer
        .render(chip("new").node_ref(node_ref.clone()), container)
        .unwrap();
    assert!(take_log().is_empty());

    let handle = slot.borrow().clone().unwrap();
    handle.set_state(|count| *count = 0);
    renderer.flush().unwrap();
    assert!(take_log().is_empty());

    handle.set_state(|count| *count = 3);
    renderer.flush().unwrap();
    assert_eq!(take_log(), ["render chip"]);
    assert_eq!(renderer.host().text_content(container), "new:3");

    renderer
        .render(chip("old").node_ref(node_ref), container)
        .unwrap();
    assert_eq!(take_log(), ["render chip"]);
    assert_eq!(renderer.host().text_content(container), "old:3");
}

#[test]
fn shallow_props_compare_values_not_order() {
    let style = PropValue::style(Props::new().with("width", 10));
    let first = Props::new()
        .with("title", "a")
        .with("count", 1)
        .with("style", style.clone());
    let reordered = Props::new()
        .with("style", style)
        .with("count", 1)
        .with("title", "a");
    assert!(first.shallow_eq(&reordered));

    let fresh_style = Props::new()
        .with("title", "a")
        .with("count", 1)
        .with("style", PropValue::style(Props::new().with("width", 10)));
    assert!(!first.shallow_eq(&fresh_style));

    let fewer = Props::new().with("title", "a").with("count", 1);
    assert!(!first.shallow_eq(&fewer));
    assert!(!fewer.shallow_eq(&first));
}

#[test]
fn subtree_inherits_parent_child_context() {
    let (mut renderer, container) = setup();
    let (node_ref, slot) = capture::<Provider>();
    renderer
        .render(
            component::<Provider>(Props::new().with("theme", "dark")).node_ref(node_ref),
            container,
        )
        .unwrap();
    let provider = slot.borrow().clone().unwrap().component_ref().unwrap();

    let overlay = renderer.host_mut().create_root();
    renderer
        .render_subtree(&provider, component::<Consumer>(Props::new()), overlay)
        .unwrap();
    assert_eq!(renderer.host().text_content(overlay), "dark");
    assert_eq!(renderer.host().text_content(container), "dark");
}
