use std::path::Path;

// Return the first existing path given a list of paths as string slices
fn get_first_path(paths: &[&'static str]) -> Option<&'static str> {
    paths.iter().find(|p| Path::new(p).exists()).copied()
}

fn main() {
    let path_tmpdir: &str =
        get_first_path(&["/tmp", "/var/tmp", "/usr/tmp"]).unwrap_or("/tmp");

    println!("cargo:rustc-env=PATH_TMPDIR_DEFAULT={path_tmpdir}");
    println!("cargo:rerun-if-changed=build.rs");
}
