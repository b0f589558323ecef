use std::process::Command;

fn git_output(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;

    if !output.status.success() {
        return None;
    }

    String::from_utf8(output.stdout).ok()
}

fn get_git_commit_hash() -> String {
    git_output(&["rev-parse", "--short=9", "HEAD"])
        .map(|hash| hash.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn get_git_commit_date() -> String {
    git_output(&["show", "-s", "--format=%cd", "--date=short", "HEAD"])
        .map(|date| date.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn main() {
    println!("cargo:rustc-env=COMMIT_HASH={}", get_git_commit_hash());
    println!("cargo:rustc-env=COMMIT_DATE={}", get_git_commit_date());
}
