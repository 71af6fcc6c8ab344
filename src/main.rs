fn main() {
    if let Err(err) = lamplight::run() {
        eprintln!("Application error: {err}");
        std::process::exit(1);
    }
}
