use super::*;
use trellis_core::{
    component, element, portal, stateless, text, void, Component, Props, Scope,
};

#[derive(Clone, Default)]
struct GreetingState {
    punctuation: String,
}

struct Greeting;

impl Component for Greeting {
    type State = GreetingState;

    fn create(_props: &Props, _context: &Context) -> Self {
        Greeting
    }

    fn will_mount(&mut self, scope: &Scope<'_, Self>) -> Result<(), ComponentError> {
        scope
            .handle()
            .set_state(|state| state.punctuation = "!".to_string());
        Ok(())
    }

    fn render(&self, scope: &Scope<'_, Self>) -> Result<Descriptor, ComponentError> {
        let name = scope.props().str("name").unwrap_or("stranger");
        let greeting = scope
            .context()
            .get("greeting")
            .and_then(PropValue::as_str)
            .unwrap_or("Hello");
        Ok(element("h1")
            .text(format!("{greeting}, {name}{}", scope.state().punctuation))
            .into())
    }
}

struct Locale;

impl Component for Locale {
    type State = ();

    fn create(_props: &Props, _context: &Context) -> Self {
        Locale
    }

    fn render(&self, scope: &Scope<'_, Self>) -> Result<Descriptor, ComponentError> {
        Ok(element("div").children(scope.children().to_vec()).into())
    }

    fn child_context(&self, _scope: &Scope<'_, Self>) -> Option<Props> {
        Some(Props::new().with("greeting", "Bonjour"))
    }
}

fn footer(props: &Props, _context: &Context) -> Result<Descriptor, ComponentError> {
    Ok(element("footer")
        .text(props.str("note").unwrap_or_default())
        .into())
}

fn broken(_props: &Props, _context: &Context) -> Result<Descriptor, ComponentError> {
    Err(ComponentError::new("no markup"))
}

fn markup(descriptor: impl Into<Descriptor>) -> String {
    render_to_string(&descriptor.into()).unwrap()
}

#[test]
fn element_with_attributes_and_text() {
    let html = markup(
        element("a")
            .prop("href", "/docs?a=1&b=2")
            .prop("className", "link")
            .text("Read <more>"),
    );
    assert_eq!(
        html,
        "<a href=\"/docs?a=1&amp;b=2\" class=\"link\">Read &lt;more&gt;</a>"
    );
}

#[test]
fn apostrophes_are_escaped_in_text_and_attributes() {
    let html = markup(
        element("span")
            .prop("title", "it's \"quoted\"")
            .text("don't"),
    );
    assert_eq!(
        html,
        "<span title=\"it&#39;s &quot;quoted&quot;\">don&#39;t</span>"
    );
}

#[test]
fn void_elements_close_themselves() {
    assert_eq!(
        markup(element("input").prop("type", "text").prop("required", true)),
        "<input type=\"text\" required/>"
    );
    assert_eq!(markup(element("br")), "<br/>");
}

#[test]
fn handlers_keys_and_false_values_are_skipped() {
    let html = markup(
        element("button")
            .key("primary")
            .prop("disabled", false)
            .prop("tabIndex", 2)
            .on("onClick", |_| {}),
    );
    assert_eq!(html, "<button tabIndex=\"2\"></button>");
}

#[test]
fn style_map_becomes_css_text() {
    let style = PropValue::style(
        Props::new()
            .with("fontSize", 12)
            .with("lineHeight", 1.5)
            .with("color", "red"),
    );
    assert_eq!(
        markup(element("p").prop("style", style)),
        "<p style=\"font-size:12px;line-height:1.5;color:red;\"></p>"
    );
}

#[test]
fn class_map_lists_enabled_names() {
    let classes = PropValue::style(
        Props::new()
            .with("active", true)
            .with("hidden", false)
            .with("wide", 1),
    );
    assert_eq!(
        markup(element("li").prop("class", classes)),
        "<li class=\"active wide\"></li>"
    );
}

#[test]
fn default_checked_yields_to_checked() {
    assert_eq!(
        markup(element("input").prop("defaultChecked", true)),
        "<input checked/>"
    );
    assert_eq!(
        markup(
            element("input")
                .prop("checked", true)
                .prop("defaultChecked", true)
        ),
        "<input checked/>"
    );
}

#[test]
fn default_value_becomes_value() {
    assert_eq!(
        markup(element("input").prop("defaultValue", "draft")),
        "<input value=\"draft\"/>"
    );
}

#[test]
fn raw_html_is_written_verbatim() {
    assert_eq!(
        markup(
            element("div")
                .prop("dangerouslySetInnerHTML", PropValue::html("<em>hi</em>"))
                .text("ignored")
        ),
        "<div><em>hi</em></div>"
    );
}

#[test]
fn svg_xlink_attributes_are_normalized() {
    assert_eq!(
        markup(element("svg").child(element("use").prop("xlink:href", "#icon"))),
        "<svg><use xlink:href=\"#icon\"></use></svg>"
    );
}

#[test]
fn empty_text_renders_as_space() {
    assert_eq!(markup(element("span").child(text(""))), "<span> </span>");
}

#[test]
fn composites_render_detached_with_context() {
    let tree = component::<Locale>(Props::new()).children([
        component::<Greeting>(Props::new().with("name", "Ada")),
    ]);
    assert_eq!(markup(tree), "<div><h1>Bonjour, Ada!</h1></div>");
    assert_eq!(
        markup(component::<Greeting>(Props::new())),
        "<h1>Hello, stranger!</h1>"
    );
}

#[test]
fn stateless_components_are_called_directly() {
    assert_eq!(
        markup(stateless(footer, Props::new().with("note", "fin"))),
        "<footer>fin</footer>"
    );
}

#[test]
fn void_and_portal_render_nothing() {
    assert_eq!(
        markup(element("div").child(void()).child(portal(7, [text("elsewhere")]))),
        "<div></div>"
    );
}

#[test]
fn component_errors_are_returned() {
    let error = render_to_static_markup(&stateless(broken, Props::new()).into()).unwrap_err();
    assert_eq!(error.message(), "no markup");
}
