fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    // tests/null_symbol.rs looks up symbols of the test binary itself
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("linux") {
        println!("cargo:rustc-link-arg-tests=-Wl,--export-dynamic");
    }
}
