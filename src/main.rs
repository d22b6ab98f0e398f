mod demo;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    demo::run()
}
