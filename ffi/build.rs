//! Generate `include/restbridge.h` from the `extern "C"` surface.

fn main() {
    println!("cargo:rerun-if-changed=src/lib.rs");
    println!("cargo:rerun-if-changed=src/types.rs");

    let crate_dir = match std::env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => dir,
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {e}");
            return;
        }
    };

    let config = cbindgen::Config {
        language: cbindgen::Language::C,
        include_guard: Some("RESTBRIDGE_H".to_string()),
        cpp_compat: true,
        ..cbindgen::Config::default()
    };

    match cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_config(config)
        .generate()
    {
        Ok(bindings) => {
            bindings.write_to_file(format!("{crate_dir}/include/restbridge.h"));
        }
        Err(e) => println!("cargo:warning=header not generated: {e}"),
    }
}
