/// Banner printed by the tools' `--version` flag.
pub fn version_banner(tool_name: &str, version: &str, release: &str, commit: &str) -> String {
    let mut out = format!("{tool_name}\nEBML/Matroska structure parser\n\n");
    out.push_str(&format!("\tVersion:     {version}\n"));
    if !release.is_empty() {
        out.push_str(&format!("\tGit tag:     {release}\n"));
    }
    if !commit.is_empty() {
        out.push_str(&format!("\tGit commit:  {commit}\n"));
    }
    out
}

pub fn print_cli_version_banner(tool_name: &str, version: &str, release: &str, commit: &str) {
    print!("{}", version_banner(tool_name, version, release, commit));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_omits_empty_fields() {
        let banner = version_banner("MKV Info Tool", "0.0.0", "", "abc123");
        assert!(banner.starts_with("MKV Info Tool\n"));
        assert!(banner.contains("Version:     0.0.0"));
        assert!(!banner.contains("Git tag"));
        assert!(banner.contains("Git commit:  abc123"));
    }
}
