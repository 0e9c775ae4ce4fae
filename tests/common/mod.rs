use extension_loader::library_file_name;
use std::path::PathBuf;

const TARGET_DIR: Option<&'static str> = option_env!("CARGO_TARGET_DIR");

pub fn lib_dir() -> PathBuf {
    let path: PathBuf = TARGET_DIR.unwrap_or("target").into();
    path.join("release")
}

pub fn lib_path() -> String {
    lib_dir()
        .join(library_file_name("example"))
        .to_str()
        .unwrap()
        .to_string()
}

const PACKAGE_NAME: [&str; 1] = ["example_dylib"];

pub fn compile() {
    static ONCE: ::std::sync::Once = ::std::sync::Once::new();
    ONCE.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
        for name in PACKAGE_NAME {
            let mut cmd = ::std::process::Command::new(env!("CARGO"));
            cmd.arg("build").arg("-r").arg("-p").arg(name);
            assert!(cmd
                .status()
                .expect("could not compile the test helpers!")
                .success());
        }
    });
}
