fn main() {
    if let Err(err) = seqdiag_renderer::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
