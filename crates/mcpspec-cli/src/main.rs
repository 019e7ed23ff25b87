fn main() -> std::process::ExitCode {
    mcpspec_cli::run()
}
