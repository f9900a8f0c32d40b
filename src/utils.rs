use indicatif::ProgressStyle;

pub fn pb_style() -> ProgressStyle {
    ProgressStyle::with_template("[{elapsed_precise}] {wide_bar} {pos}/{len} [ETA {eta}] {msg}")
        .expect("failed to build progress style")
}

/// 带速率显示的进度条样式
pub fn pb_style_speed() -> ProgressStyle {
    ProgressStyle::with_template(
        "[{elapsed_precise}] {wide_bar} {pos}/{len} ({per_sec}) [ETA {eta}] {msg}",
    )
    .expect("failed to build progress style")
}

/// 将算法名称转换为可以用作文件名的字符串
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("LibSQL(diskann-n32,l2)"), "LibSQL_diskann-n32_l2_");
        assert_eq!(sanitize_file_name("a b/c"), "a_b_c");
    }
}
