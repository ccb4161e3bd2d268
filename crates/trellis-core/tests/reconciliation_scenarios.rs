//! End-to-end update scenarios driven through the test harness.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use trellis_core::{
    component, element, Component, ComponentError, ComponentRef, Context, Descriptor, Handle,
    HostId, HostTree, NodeRef, Props, RefTarget, RenderError, Scope,
};
use trellis_testing::TrellisTestRule;

thread_local! {
    static RENDERS: Cell<usize> = const { Cell::new(0) };
}

struct Row;

impl Component for Row {
    type State = ();

    fn create(_props: &Props, _context: &Context) -> Self {
        Row
    }

    fn render(&self, scope: &Scope<'_, Self>) -> Result<Descriptor, ComponentError> {
        let label = scope.props().str("label").unwrap_or_default();
        Ok(element("li").text(label.to_string()).into())
    }
}

fn rows(order: &[(i64, &str)]) -> Descriptor {
    element("ul")
        .children(
            order
                .iter()
                .map(|(key, label)| component::<Row>(Props::new().with("label", *label)).key(*key)),
        )
        .into()
}

fn row_hosts(rule: &TrellisTestRule) -> Vec<(String, HostId)> {
    rule.find_all("li")
        .into_iter()
        .map(|id| (rule.host().text_content(id), id))
        .collect()
}

fn host_for(hosts: &[(String, HostId)], label: &str) -> HostId {
    hosts
        .iter()
        .find(|(text, _)| text == label)
        .map(|(_, id)| *id)
        .expect("row present")
}

type Order = Rc<RefCell<Vec<(i64, &'static str)>>>;

/// Rule whose content renders the row order held in the returned cell.
fn row_rule(initial: Vec<(i64, &'static str)>) -> (TrellisTestRule, Order) {
    let order = Rc::new(RefCell::new(initial));
    let source = Rc::clone(&order);
    let mut rule = TrellisTestRule::new();
    rule.set_content(move || rows(&source.borrow()))
        .expect("initial render");
    (rule, order)
}

#[test]
fn appended_row_keeps_first_host() {
    let (mut rule, order) = row_rule(vec![(1, "one")]);
    let first = host_for(&row_hosts(&rule), "one");

    order.borrow_mut().push((2, "two"));
    rule.rerender().expect("rerender");

    let hosts = row_hosts(&rule);
    assert_eq!(hosts.len(), 2);
    assert_eq!(hosts[0], ("one".to_string(), first));
    assert_eq!(hosts[1].0, "two");
    assert_eq!(rule.move_count(), 0);
}

#[test]
fn rotated_rows_move_exactly_once() {
    let (mut rule, order) = row_rule(vec![(1, "a"), (2, "b"), (3, "c")]);
    let before = row_hosts(&rule);
    rule.reset_mutations();

    *order.borrow_mut() = vec![(3, "c"), (1, "a"), (2, "b")];
    rule.rerender().expect("rerender");

    let after = row_hosts(&rule);
    let labels: Vec<&str> = after.iter().map(|(text, _)| text.as_str()).collect();
    assert_eq!(labels, ["c", "a", "b"]);
    for label in ["a", "b", "c"] {
        assert_eq!(host_for(&before, label), host_for(&after, label));
    }
    assert_eq!(rule.move_count(), 1);
    assert_eq!(rule.mutation_count(), 1);
}

#[test]
fn emptied_rows_leave_no_children() {
    let (mut rule, order) = row_rule(vec![(1, "a"), (2, "b")]);
    let list = rule.find("ul").expect("list rendered");

    order.borrow_mut().clear();
    rule.rerender().expect("rerender");

    assert!(rule.host().children(list).is_empty());
    assert!(rule.find_all("li").is_empty());
}

#[derive(Clone, Default)]
struct Tally {
    total: i64,
}

struct Guarded;

impl Component for Guarded {
    type State = Tally;

    fn create(_props: &Props, _context: &Context) -> Self {
        Guarded
    }

    fn render(&self, scope: &Scope<'_, Self>) -> Result<Descriptor, ComponentError> {
        RENDERS.with(|renders| renders.set(renders.get() + 1));
        let title = scope.props().str("title").unwrap_or_default();
        Ok(element("section")
            .text(format!("{title}:{}", scope.state().total))
            .into())
    }

    fn should_update(
        &self,
        next_props: &Props,
        _next_state: &Tally,
        _next_context: &Context,
        _scope: &Scope<'_, Self>,
    ) -> bool {
        !next_props.bool("frozen").unwrap_or(false)
    }
}

fn mount_guarded(rule: &mut TrellisTestRule, props: Rc<RefCell<Props>>) -> Handle<Guarded> {
    let slot: Rc<RefCell<Option<Handle<Guarded>>>> = Rc::default();
    let sink = Rc::clone(&slot);
    let node_ref = NodeRef::callback(move |target: Option<&RefTarget>| {
        if let Some(handle) = target
            .and_then(RefTarget::component)
            .and_then(ComponentRef::handle::<Guarded>)
        {
            *sink.borrow_mut() = Some(handle);
        }
    });
    rule.set_content(move || {
        component::<Guarded>(props.borrow().clone())
            .node_ref(node_ref.clone())
            .into()
    })
    .expect("initial render");
    let handle = slot.borrow().clone();
    handle.expect("handle captured on mount")
}

#[test]
fn rejected_update_still_stores_new_values() {
    let props = Rc::new(RefCell::new(Props::new().with("title", "draft")));
    let mut rule = TrellisTestRule::new();
    let handle = mount_guarded(&mut rule, Rc::clone(&props));
    assert_eq!(rule.text_content(), "draft:0");
    rule.reset_mutations();

    *props.borrow_mut() = Props::new().with("title", "final").with("frozen", true);
    handle.set_state(|tally| tally.total = 7);
    rule.rerender().expect("rerender");

    assert_eq!(rule.mutation_count(), 0);
    assert_eq!(rule.text_content(), "draft:0");
    let title = handle.with_props(|props| props.str("title").map(str::to_string));
    assert_eq!(title.flatten().as_deref(), Some("final"));
    assert_eq!(handle.with_state(|tally| tally.total), Some(7));

    *props.borrow_mut() = Props::new().with("title", "final");
    rule.rerender().expect("rerender");
    assert_eq!(rule.text_content(), "final:7");
}

#[test]
fn two_requests_merge_into_one_render() {
    let props = Rc::new(RefCell::new(Props::new().with("title", "sum")));
    let mut rule = TrellisTestRule::new();
    let handle = mount_guarded(&mut rule, props);
    let renders = RENDERS.with(Cell::get);

    handle.set_state(|tally| tally.total += 2);
    handle.set_state(|tally| tally.total *= 10);

    assert_eq!(rule.flush_requests(), 1);
    assert_eq!(rule.flush().expect("flush"), 1);
    assert_eq!(RENDERS.with(Cell::get), renders + 1);
    assert_eq!(rule.text_content(), "sum:20");
}

struct Exploding;

impl Component for Exploding {
    type State = ();

    fn create(_props: &Props, _context: &Context) -> Self {
        Exploding
    }

    fn render(&self, scope: &Scope<'_, Self>) -> Result<Descriptor, ComponentError> {
        if scope.props().bool("explode").unwrap_or(false) {
            return Err(ComponentError::new("render failed"));
        }
        Ok(element("em").text("calm").into())
    }
}

#[test]
fn unhandled_descendant_error_reaches_caller() {
    let explode = Rc::new(Cell::new(false));
    let flag = Rc::clone(&explode);
    let mut rule = TrellisTestRule::new();
    rule.set_content(move || {
        element("article")
            .child(element("div").child(component::<Exploding>(
                Props::new().with("explode", flag.get()),
            )))
            .into()
    })
    .expect("initial render");
    assert_eq!(rule.text_content(), "calm");

    explode.set(true);
    let error = rule.rerender().expect_err("render error propagates");

    match error {
        RenderError::Unhandled { component, error } => {
            assert_eq!(component, "Exploding");
            assert_eq!(error.message(), "render failed");
        }
        other => panic!("unexpected error: {other}"),
    }
}
