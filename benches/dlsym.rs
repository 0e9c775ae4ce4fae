use criterion::{criterion_group, criterion_main, Criterion};
use extension_loader::{adapter, Library};
use libloading::Library as LibLoading;
use std::path::Path;

fn get_symbol(c: &mut Criterion) {
    let path = Path::new("./target/release/libexample.so");
    let lib1 = Library::open(path).unwrap();
    let lib2 = unsafe { LibLoading::new(path).unwrap() };
    let handle = lib1.handle();
    c.bench_function("extension-loader:get", |b| {
        b.iter(|| unsafe { lib1.get::<extern "C" fn(i32, i32) -> i32>("add").unwrap() })
    });
    c.bench_function("extension-loader:resolve_symbol", |b| {
        b.iter(|| unsafe { adapter::resolve_symbol(handle, "add").unwrap() })
    });
    c.bench_function("libloading:get", |b| {
        b.iter(|| {
            unsafe {
                lib2.get::<extern "C" fn(i32, i32) -> i32>("add".as_bytes())
                    .unwrap()
            };
        })
    });
}

criterion_group!(benches, get_symbol);
criterion_main!(benches);
