use anyhow::Result;

fn main() -> Result<()> {
    gilt_cli::main()
}
