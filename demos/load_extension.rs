use extension_loader::{Extension, SnapshotSymbols};
use std::path::Path;

fn main() {
    env_logger::init();
    let dir = Path::new("./target/release");
    let ext = Extension::load(dir, "example").unwrap();
    let init = unsafe { ext.init::<extern "C" fn() -> i32>() };
    println!("example_Init returned {}", init());

    let add = unsafe {
        ext.library()
            .get::<extern "C" fn(i32, i32) -> i32>("add")
            .unwrap()
    };
    println!("{}", add(1, 1));

    match SnapshotSymbols::resolve(ext.library()) {
        Ok(symbols) => println!("{:?}", symbols),
        Err(err) => println!("no snapshot: {}", err),
    }
}
