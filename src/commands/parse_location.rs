use anyhow::Result;

use surfe_diem::error;
use surfe_diem::parser::parse_coordinates;

/// Print the `[lon, lat]` pair parsed from an NDBC location string
pub fn parse_location(text: &str) -> Result<()> {
    println!("{}", render_lon_lat(text)?);
    Ok(())
}

fn render_lon_lat(text: &str) -> error::Result<String> {
    let coords = parse_coordinates(text)?;
    Ok(serde_json::to_string(&coords.to_lon_lat())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use surfe_diem::error::ErrorCategory;

    #[test]
    fn test_render_lon_lat() {
        let rendered = render_lon_lat("37.754 N 122.839 W (37°45'14\" N 122°50'20\" W)").unwrap();
        assert_eq!(rendered, "[-122.839,37.754]");
    }

    #[test]
    fn test_unparsable_text_is_a_parsing_error() {
        let err = render_lon_lat("somewhere offshore").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Parsing);
        assert!(!err.is_recoverable());
    }
}
