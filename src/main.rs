fn main() {
    // Failures are reported in the JSON on stdout; the exit status stays 0.
    if let Err(err) = portrisk::cli::run() {
        portrisk::ui::eprintln_error(&err);
    }
}
