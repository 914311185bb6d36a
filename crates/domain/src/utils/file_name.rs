//! ASCII-safe file names for exports and uploaded documents

use deunicode::deunicode;

/// Transliterate to ASCII and replace everything outside `[A-Za-z0-9_-]`
/// with `_`, collapsing runs and trimming them at both ends.
pub fn convert_to_ascii_filename(name: &str) -> String {
    let ascii = deunicode(name);
    let mut result = String::with_capacity(ascii.len());
    let mut last_was_separator = false;

    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() || c == '-' {
            result.push(c);
            last_was_separator = false;
        } else if !last_was_separator {
            result.push('_');
            last_was_separator = true;
        }
    }

    result.trim_matches('_').to_string()
}

/// File name for an uploaded invoice document: lowercase `[a-z0-9_]`,
/// at most `limit` characters, followed by `.extension`.
pub fn invoice_document_filename(original: &str, extension: &str, limit: usize) -> String {
    let stem: String = deunicode(original)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .map(|c| c.to_ascii_lowercase())
        .take(limit)
        .collect();
    format!("{stem}.{}", extension.trim_start_matches('.').to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_latin_and_cyrillic() {
        let cases = [
            ("Barß / laölala #   ld_ksjf 123 MyAwesome GmbH", "Barss_laolala_ld_ksjf_123_MyAwesome_GmbH"),
            (" сп.асибо/спа   сибо#/!спас -- ибо!!", "sp_asibo_spa_sibo_spas_--_ibo"),
            ("Demo ProjecT1", "Demo_ProjecT1"),
            ("kimai-export", "kimai-export"),
            ("D\"e&m%o# Pr'oj\\e/c?T1", "D_e_m_o_Pr_oj_e_c_T1"),
        ];
        for (input, expected) in cases {
            assert_eq!(convert_to_ascii_filename(input), expected, "{input}");
        }
    }

    #[test]
    fn invoice_document_names_are_limited() {
        assert_eq!(invoice_document_filename("My Invoice-2024", "TXT", 20), "myinvoice2024.txt");
        assert_eq!(
            invoice_document_filename("a_very_long_document_name_here", ".md", 20),
            "a_very_long_document.md"
        );
    }
}
