use crate::UrlError;
use std::path::PathBuf;
use url::Url;

/// Derives the default dataset path for a source page
///
/// The host becomes a directory and the trimmed path the file name, with a
/// `.json` suffix. A bare host maps to `<host>.json`. Non-default ports are
/// kept as `<host>_<port>`.
///
/// # Examples
///
/// ```
/// use awesome_metrics::url::default_output_path;
/// use std::path::PathBuf;
/// use url::Url;
///
/// let url = Url::parse("https://github.com/rust-unofficial/awesome-rust").unwrap();
/// assert_eq!(
///     default_output_path(&url).unwrap(),
///     PathBuf::from("github.com/rust-unofficial/awesome-rust.json")
/// );
///
/// let url = Url::parse("https://awesome.re/").unwrap();
/// assert_eq!(default_output_path(&url).unwrap(), PathBuf::from("awesome.re.json"));
/// ```
pub fn default_output_path(url: &Url) -> Result<PathBuf, UrlError> {
    let host = url.host_str().ok_or(UrlError::MissingDomain)?;
    let root = match url.port() {
        Some(port) => format!("{}_{}", host, port),
        None => host.to_string(),
    };

    let segments: Vec<&str> = url
        .path()
        .split('/')
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .collect();

    let Some((last, parents)) = segments.split_last() else {
        return Ok(PathBuf::from(format!("{}.json", root)));
    };

    let mut path = PathBuf::from(root);
    path.extend(parents);
    path.push(format!("{}.json", last));
    Ok(path)
}
