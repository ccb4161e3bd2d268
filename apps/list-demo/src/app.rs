//! Todo list used by the demo binary.

use std::rc::Rc;

use trellis_core::{
    component, element, stateless, Component, ComponentError, Context, Descriptor, Event,
    HostId, HostTree, MemoryHost, PropValue, Props, Scope,
};

#[derive(Clone, Debug)]
pub struct Todo {
    pub id: i64,
    pub title: Rc<str>,
    pub done: bool,
}

#[derive(Clone, Debug, Default)]
pub struct TodoState {
    items: Vec<Todo>,
    draft: String,
    next_id: i64,
}

impl TodoState {
    fn add(&mut self, title: &str) {
        self.next_id += 1;
        self.items.push(Todo {
            id: self.next_id,
            title: title.into(),
            done: false,
        });
    }
}

/// Stateful list: a draft input, a few buttons and one keyed row per item.
pub struct TodoApp;

impl Component for TodoApp {
    type State = TodoState;

    fn create(_props: &Props, _context: &Context) -> Self {
        TodoApp
    }

    fn initial_state(&self, props: &Props) -> TodoState {
        let mut state = TodoState::default();
        for title in props.str("seed").unwrap_or_default().split(',') {
            let title = title.trim();
            if !title.is_empty() {
                state.add(title);
            }
        }
        state
    }

    fn render(&self, scope: &Scope<'_, Self>) -> Result<Descriptor, ComponentError> {
        let state = scope.state();
        let title = scope.props().str("title").unwrap_or("Todo");

        let typing = scope.handle();
        let adding = scope.handle();
        let reversing = scope.handle();
        let clearing = scope.handle();

        let rows = state.items.iter().map(|todo| {
            let toggling = scope.handle();
            let id = todo.id;
            let props = Props::new()
                .with("title", todo.title.clone())
                .with("done", todo.done)
                .with(
                    "onToggle",
                    PropValue::handler(move |_| {
                        toggling.set_state(move |state: &mut TodoState| {
                            if let Some(todo) = state.items.iter_mut().find(|todo| todo.id == id) {
                                todo.done = !todo.done;
                            }
                        })
                    }),
                );
            stateless(todo_row, props).key(id)
        });

        let remaining = state.items.iter().filter(|todo| !todo.done).count();
        Ok(element("section")
            .prop("className", "todo-app")
            .child(element("h1").text(title.to_string()))
            .child(
                element("input")
                    .prop("value", state.draft.clone())
                    .prop("placeholder", "What needs doing?")
                    .on("onChange", move |event: &Event| {
                        let text = event.detail().as_str().unwrap_or_default().to_string();
                        typing.set_state(move |state: &mut TodoState| state.draft = text);
                    }),
            )
            .child(element("button").text("Add").on("onClick", move |_| {
                adding.set_state(|state: &mut TodoState| {
                    let draft = std::mem::take(&mut state.draft);
                    if !draft.trim().is_empty() {
                        state.add(draft.trim());
                    }
                })
            }))
            .child(element("button").text("Reverse").on("onClick", move |_| {
                reversing.set_state(|state: &mut TodoState| state.items.reverse())
            }))
            .child(
                element("button")
                    .text("Clear done")
                    .on("onClick", move |_| {
                        clearing.set_state(|state: &mut TodoState| {
                            state.items.retain(|todo| !todo.done)
                        })
                    }),
            )
            .child(element("ul").children(rows))
            .child(element("footer").text(format!("{remaining} left")))
            .into())
    }
}

fn todo_row(props: &Props, _context: &Context) -> Result<Descriptor, ComponentError> {
    let done = props.bool("done").unwrap_or(false);
    let mut row = element("li")
        .prop("className", if done { "done" } else { "pending" })
        .text(props.str("title").unwrap_or_default().to_string());
    if let Some(toggle) = props.get("onToggle").filter(|value| value.as_handler().is_some()) {
        row = row.prop("onClick", toggle.clone());
    }
    Ok(row.into())
}

pub fn todo_app(title: &str, seed: &str) -> Descriptor {
    component::<TodoApp>(Props::new().with("title", title).with("seed", seed)).into()
}

/// First element under `root` with `tag` whose text is `label`.
pub fn find_labeled(host: &MemoryHost, root: HostId, tag: &str, label: &str) -> Option<HostId> {
    host.children(root).into_iter().find_map(|child| {
        if host.tag(child) == Some(tag) && host.text_content(child) == label {
            Some(child)
        } else {
            find_labeled(host, child, tag, label)
        }
    })
}

/// First element under `root` with `tag`.
pub fn find_tag(host: &MemoryHost, root: HostId, tag: &str) -> Option<HostId> {
    host.children(root).into_iter().find_map(|child| {
        if host.tag(child) == Some(tag) {
            Some(child)
        } else {
            find_tag(host, child, tag)
        }
    })
}
