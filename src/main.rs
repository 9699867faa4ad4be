fn main() -> anyhow::Result<()> {
    pf_cli::run()
}
