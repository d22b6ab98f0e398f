use anyhow::Context;
use fntry_core::{observer::LogObserver, CallableExt, Outcome, Wrapper};
use log::info;
use serde_json::Value;
use std::fmt::Display;

/// Runs a handful of invocations through the wrapper and prints their outcomes as JSON.
pub fn run() -> anyhow::Result<()> {
    let wrapper = Wrapper::new()
        .label("demo")
        .failure_level(log::Level::Info)
        .observer(LogObserver::default());

    let outcome = wrapper
        .invoke(|raw: &str| serde_json::from_str::<Value>(raw), ("}",))
        .wait();
    print("parse \"}\"", outcome)?;

    let outcome = wrapper.invoke(|| anyhow::Ok(42), ()).wait();
    print("constant", outcome)?;

    let outcome = wrapper
        .invoke(|| async { Err::<Value, _>("network down") }, ())
        .wait();
    print("fetch", outcome)?;

    let mut queue = vec!["first".to_string(), "second".to_string()];
    let outcome = pop_front.try_call_with(&mut queue, ()).wait();
    print("pop_front", outcome)?;

    let outcome = wrapper
        .invoke(
            |items: &[u8], at: usize| -> Result<u8, String> { Ok(items[at]) },
            (&[1, 2, 3][..], 7),
        )
        .wait();
    print("index", outcome)?;

    Ok(())
}

fn pop_front(queue: &mut Vec<String>) -> Result<String, String> {
    if queue.is_empty() {
        return Err("queue is empty".to_string());
    }
    Ok(queue.remove(0))
}

fn print<T, E>(name: &str, outcome: Outcome<T, E>) -> anyhow::Result<()>
where
    T: serde::Serialize,
    E: Display,
{
    info!("demo::print - {} failed: {}", name, outcome.failed());

    let outcome = outcome.map_err(|e| e.to_string());
    let json = serde_json::to_string(&outcome)
        .with_context(|| format!("could not serialize outcome of {}", name))?;
    println!("{}: {}", name, json);

    Ok(())
}
