use std::path::Path;

/// Write an SVG document to `path`.
pub fn save_svg(svg: &str, path: &Path) -> crate::Result<()> {
    std::fs::write(path, svg)?;
    Ok(())
}
