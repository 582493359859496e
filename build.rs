fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Host builds (tests, simulation) have no ESP-IDF toolchain to export.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
