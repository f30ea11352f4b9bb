use std::path::Path;

/// Reads the `package` clause of a Java source without a full parse.
pub fn extract_package(content: &str) -> Option<String> {
    let mut in_block_comment = false;
    for line in content.lines() {
        let mut line = line.trim();

        if in_block_comment {
            match line.find("*/") {
                Some(end) => {
                    in_block_comment = false;
                    line = line[end + 2..].trim();
                }
                None => continue,
            }
        }
        if line.starts_with("/*") {
            match line.find("*/") {
                Some(end) => line = line[end + 2..].trim(),
                None => {
                    in_block_comment = true;
                    continue;
                }
            }
        }
        if line.is_empty() || line.starts_with("//") || line.starts_with('@') {
            continue;
        }

        let rest = line.strip_prefix("package ")?;
        let pkg = rest.split(';').next().unwrap_or(rest).trim();
        let pkg: String = pkg.chars().filter(|c| !c.is_whitespace()).collect();
        return if pkg.is_empty() { None } else { Some(pkg) };
    }
    None
}

/// Qualified name of the type a `.java` file is named after.
///
/// `package-info.java` and `module-info.java` declare no type and yield `None`.
pub fn qualified_name_for_file(path: &Path, content: &str) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    if stem.is_empty() || stem.contains('-') {
        return None;
    }
    Some(match extract_package(content) {
        Some(pkg) => format!("{pkg}.{stem}"),
        None => stem.to_string(),
    })
}

/// Qualified name for an archive entry such as `org/example/Person.java`.
pub fn qualified_name_for_entry(entry: &str) -> Option<String> {
    let path = entry.strip_suffix(".java")?;
    let stem = path.rsplit(|c: char| c == '/' || c == '\\').next()?;
    if stem.is_empty() || stem.contains('-') || stem.contains('$') {
        return None;
    }
    Some(path.replace(['/', '\\'], "."))
}
