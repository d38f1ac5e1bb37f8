fn main() -> anyhow::Result<()> {
    error_sieve::run()
}
