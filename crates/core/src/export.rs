//! Annotation CSV export.

use crate::csv::{csv_row, UTF8_BOM};
use crate::storage::{export_s3_path, file_name};

/// Header row of the export.
pub const EXPORT_HEADER: [&str; 3] = ["s3_path", "image_filename", "vitality_score"];

/// One exported annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportLine {
    pub image_obj_key: String,
    pub vitality_value: i32,
}

/// Render the export document, BOM first, one line per annotation.
pub fn build_export_csv(bucket: &str, lines: &[ExportLine]) -> String {
    let mut out = String::from(UTF8_BOM);
    out.push_str(&csv_row(EXPORT_HEADER));
    out.push_str("\r\n");
    for line in lines {
        let row = [
            export_s3_path(bucket, &line.image_obj_key),
            file_name(&line.image_obj_key).to_string(),
            line.vitality_value.to_string(),
        ];
        out.push_str(&csv_row(row));
        out.push_str("\r\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv::parse_csv;

    #[test]
    fn empty_export_has_bom_and_header() {
        let csv = build_export_csv("b", &[]);
        assert!(csv.starts_with('\u{feff}'));
        assert_eq!(parse_csv(&csv), vec![vec!["s3_path", "image_filename", "vitality_score"]]);
    }

    #[test]
    fn rows_carry_path_file_name_and_score() {
        let lines = vec![
            ExportLine {
                image_obj_key: "2024/04/01/image1.jpg".into(),
                vitality_value: 3,
            },
            ExportLine {
                image_obj_key: "2024/04/02/image2.jpg".into(),
                vitality_value: -1,
            },
        ];
        let rows = parse_csv(&build_export_csv("contents", &lines));
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[1],
            vec![
                "s3://contents/sakura_camera/media/trees/2024/04/01/image1.jpg",
                "image1.jpg",
                "3"
            ]
        );
        assert_eq!(rows[2][2], "-1");
    }
}
