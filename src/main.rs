fn main() -> anyhow::Result<()> {
    quizmatch::cli::run()
}
