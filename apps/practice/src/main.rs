fn main() -> anyhow::Result<()> {
    practice::run()
}
