fn main() {
    std::process::exit(envlaunch::run_cli());
}
