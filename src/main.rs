fn main() {
    if let Err(e) = clinic_followup_lib::run() {
        tracing::error!("{e}");
        eprintln!("clinic-followup: {e}");
        std::process::exit(1);
    }
}
