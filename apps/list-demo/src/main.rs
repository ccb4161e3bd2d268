mod app;

use anyhow::{anyhow, Context as _};
use trellis_core::{HostId, MemoryHost, PropValue, Renderer};
use trellis_runtime_std::StdRuntime;

use crate::app::{find_labeled, find_tag, todo_app};

/// One scripted user interaction.
enum Step {
    Type(&'static str),
    Click(&'static str),
    Toggle(&'static str),
}

const SCRIPT: &[Step] = &[
    Step::Type("bread"),
    Step::Click("Add"),
    Step::Type("eggs"),
    Step::Click("Add"),
    Step::Toggle("milk"),
    Step::Click("Reverse"),
    Step::Click("Clear done"),
];

fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .format_timestamp_millis()
            .try_init();
    }
}

fn main() -> anyhow::Result<()> {
    init_logging();

    println!("=== Trellis keyed list demo ===");
    let markup = trellis_markup::render_to_string(&todo_app("Groceries", "milk, butter"))?;
    println!("Server markup:\n{markup}\n");

    let runtime = StdRuntime::new();
    let mut host = MemoryHost::new();
    let container = host.create_root();
    let mut renderer = Renderer::new(host, runtime.runtime());
    renderer
        .render(todo_app("Groceries", "milk, butter"), container)
        .context("initial render")?;
    print_tree("initial", &renderer, container);

    for step in SCRIPT {
        let label = perform(&renderer, container, step)?;
        if runtime.take_flush_request() {
            renderer.host_mut().reset_mutations();
            let updated = renderer.flush().context("flush")?;
            log::info!("{label}: {updated} component(s) updated");
            let moves = renderer
                .host()
                .ops()
                .iter()
                .filter(|op| matches!(op, trellis_core::HostOp::Move { .. }))
                .count();
            println!(
                "{label}: {} mutation(s), {moves} move(s)",
                renderer.host().mutation_count()
            );
        }
    }
    print_tree("final", &renderer, container);

    renderer.unmount(container).context("unmount")?;
    Ok(())
}

fn perform(
    renderer: &Renderer<MemoryHost>,
    container: HostId,
    step: &Step,
) -> anyhow::Result<String> {
    let host = renderer.host();
    match step {
        Step::Type(text) => {
            let input = find_tag(host, container, "input").ok_or_else(|| anyhow!("no input"))?;
            renderer.dispatch_event("input", input, PropValue::from(*text));
            Ok(format!("type {text:?}"))
        }
        Step::Click(label) => {
            let button = find_labeled(host, container, "button", label)
                .ok_or_else(|| anyhow!("no button labeled {label:?}"))?;
            renderer.dispatch_event("click", button, PropValue::Null);
            Ok(format!("click {label:?}"))
        }
        Step::Toggle(title) => {
            let row = find_labeled(host, container, "li", title)
                .ok_or_else(|| anyhow!("no row titled {title:?}"))?;
            renderer.dispatch_event("click", row, PropValue::Null);
            Ok(format!("toggle {title:?}"))
        }
    }
}

fn print_tree(label: &str, renderer: &Renderer<MemoryHost>, container: HostId) {
    println!("--- {label} ---");
    print!("{}", renderer.host().dump_tree(Some(container)));
}
