fn main() {
    if let Err(err) = jobcomp_report::app::run() {
        eprintln!("job completion report failed: {err}");
        std::process::exit(1);
    }
}
