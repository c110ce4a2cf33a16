// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::Url;

/// 提取页面URL的authority部分（主机名，带非默认端口）
///
/// 无法解析或没有主机名的URL返回 `None`
pub fn page_domain(page_url: &str) -> Option<String> {
    let parsed = Url::parse(page_url).ok()?;
    let host = parsed.host_str()?;
    Some(match parsed.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// 判断URL是否已带HTTP(S)协议
pub fn has_http_scheme(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// 将图片地址转换为绝对URL
///
/// 其余地址（包括 `//host/path` 与 `data:`）去掉开头的斜杠后拼接到 `https://{domain}/`
pub fn absolutize(domain: &str, raw: &str) -> String {
    let raw = raw.trim();
    if has_http_scheme(raw) {
        return raw.to_string();
    }
    format!("https://{}/{}", domain, raw.trim_start_matches('/'))
}

/// 不区分大小写的子串匹配，任一关键字命中即返回 `true`
pub fn contains_any_ignore_case<S: AsRef<str>>(haystack: &str, needles: &[S]) -> bool {
    let haystack = haystack.to_lowercase();
    needles
        .iter()
        .map(|n| n.as_ref().trim())
        .filter(|n| !n.is_empty())
        .any(|n| haystack.contains(&n.to_lowercase()))
}
