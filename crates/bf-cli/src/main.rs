fn main() {
    std::process::exit(bf_cli::run_cli_from_args(std::env::args_os()));
}
