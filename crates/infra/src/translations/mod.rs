//! XLIFF translation maintenance
//!
//! Core translations live in `translations/`, plugin translations in
//! `<plugins>/*/Resources/translations/`. Files are named
//! `<domain>.<locale>.xlf` or `<domain>.<locale>.xliff`.

mod deepl;
mod error;
mod xliff;

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

pub use deepl::{deepl_language, DeeplClient};
pub use error::{TranslationError, TranslationResult};
use tracing::{debug, info, warn};
pub use xliff::{generate_id, sibling_for_locale, split_file_name, TransUnit, XliffDocument};

const ENGLISH: &str = "en";

/// Locale whose targets fill empty targets of `locale`.
pub fn fallback_locale(locale: &str) -> &'static str {
    match locale {
        "de_CH" | "de-CH" => "de",
        "pt_BR" | "pt-BR" => "pt",
        "pt" => "pt_BR",
        _ => ENGLISH,
    }
}

fn is_xliff(path: &Path) -> bool {
    matches!(path.extension().and_then(|e| e.to_str()), Some("xlf" | "xliff"))
}

fn xliff_files_in(dir: &Path) -> TranslationResult<Vec<PathBuf>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && is_xliff(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

pub struct TranslationTool {
    translations_dir: PathBuf,
    plugins_dir: PathBuf,
}

impl TranslationTool {
    pub fn new(translations_dir: impl Into<PathBuf>, plugins_dir: impl Into<PathBuf>) -> Self {
        Self { translations_dir: translations_dir.into(), plugins_dir: plugins_dir.into() }
    }

    pub fn core_files(&self) -> TranslationResult<Vec<PathBuf>> {
        xliff_files_in(&self.translations_dir)
    }

    pub fn plugin_files(&self) -> TranslationResult<Vec<PathBuf>> {
        let entries = match std::fs::read_dir(&self.plugins_dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut plugins: Vec<PathBuf> =
            entries.filter_map(|e| e.ok().map(|e| e.path())).filter(|p| p.is_dir()).collect();
        plugins.sort();

        let mut files = Vec::new();
        for plugin in plugins {
            files.extend(xliff_files_in(&plugin.join("Resources").join("translations"))?);
        }
        Ok(files)
    }

    /// Core files followed by plugin files.
    pub fn all_files(&self) -> TranslationResult<Vec<PathBuf>> {
        let mut files = self.core_files()?;
        files.extend(self.plugin_files()?);
        Ok(files)
    }

    /// Drop headers, default `resname` to the source and regenerate ids.
    ///
    /// Returns the number of rewritten files.
    pub fn fix_resnames(&self) -> TranslationResult<usize> {
        let files = self.all_files()?;
        for file in &files {
            let mut document = XliffDocument::load(file)?;
            for unit in &mut document.units {
                if unit.resname.is_none() {
                    unit.resname = Some(unit.source.clone());
                }
                unit.id = generate_id(&unit.source);
            }
            document.save(file)?;
            debug!(file = %file.display(), "resnames fixed");
        }
        info!(files = files.len(), "translation ids regenerated");
        Ok(files.len())
    }

    /// Keys used in more than one translation domain, with those domains.
    pub fn duplicates(&self) -> TranslationResult<BTreeMap<String, Vec<String>>> {
        let mut domains: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for file in self.all_files()? {
            let Some((domain, _)) = split_file_name(&file) else {
                continue;
            };
            for unit in XliffDocument::load(&file)?.units {
                let key = unit.resname.unwrap_or_default();
                let seen = domains.entry(key).or_default();
                if !seen.contains(&domain) {
                    seen.push(domain.clone());
                }
            }
        }

        domains.retain(|_, seen| seen.len() > 1);
        Ok(domains)
    }

    /// Remove the unit with resname `key` from every core translation file.
    ///
    /// Returns the number of files that contained the key.
    pub fn delete_resname(&self, key: &str) -> TranslationResult<usize> {
        let mut changed = 0;
        for file in self.core_files()? {
            let mut document = XliffDocument::load(&file)?;
            let position = document.units.iter().position(|u| u.resname.as_deref() == Some(key));
            if let Some(index) = position {
                document.units.remove(index);
                changed += 1;
            }
            document.save(&file)?;
        }
        info!(key, files = changed, "translation key deleted");
        Ok(changed)
    }

    /// Files using the `.xlf` extension instead of `.xliff`, relative to
    /// their base directory.
    pub fn wrong_extensions(&self) -> TranslationResult<Vec<PathBuf>> {
        let mut found = Vec::new();
        for file in self.all_files()? {
            if file.extension().and_then(|e| e.to_str()) == Some("xlf") {
                let relative = file
                    .strip_prefix(&self.translations_dir)
                    .or_else(|_| file.strip_prefix(&self.plugins_dir))
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|_| file.clone());
                warn!(file = %relative.display(), "translation file uses .xlf extension");
                found.push(relative);
            }
        }
        Ok(found)
    }

    /// Fill empty targets from the fallback locale and mark them
    /// `needs-translation`.
    ///
    /// Returns the number of filled units.
    pub fn fill_empty(&self) -> TranslationResult<usize> {
        let mut cache: HashMap<(String, String), HashMap<String, String>> = HashMap::new();
        let mut filled = 0;

        for file in self.all_files()? {
            let Some((domain, locale)) = split_file_name(&file) else {
                continue;
            };
            let from = fallback_locale(&locale);

            let key = (from.to_string(), domain.clone());
            if !cache.contains_key(&key) {
                let source_file = sibling_for_locale(&file, from)
                    .filter(|p| p.exists())
                    .ok_or_else(|| {
                        TranslationError::MissingFile(
                            sibling_for_locale(&file, from).unwrap_or_else(|| file.clone()),
                        )
                    })?;
                cache.insert(key.clone(), targets_by_resname(&source_file)?);
            }

            if locale == from {
                continue;
            }

            let fallback = &cache[&key];
            filled += fill_file(&file, fallback)?;
        }

        info!(units = filled, "empty translations filled");
        Ok(filled)
    }

    /// Parse every translation file and check `target-language` against the
    /// locale in the file name.
    ///
    /// Returns one message per invalid file.
    pub fn lint(&self) -> TranslationResult<Vec<String>> {
        let mut problems = Vec::new();
        for file in self.all_files()? {
            match XliffDocument::load(&file) {
                Ok(document) => {
                    let expected = split_file_name(&file).map(|(_, locale)| locale);
                    if let (Some(target), Some(expected)) = (document.target_language(), expected) {
                        if target.replace('-', "_") != expected.replace('-', "_") {
                            problems.push(format!(
                                "{}: target-language \"{target}\" does not match locale \"{expected}\"",
                                file.display()
                            ));
                        }
                    }
                }
                Err(err) => problems.push(err.to_string()),
            }
        }
        Ok(problems)
    }

    /// Translate missing units of every english core file into `locale`
    /// and write `<domain>.<locale>.xlf`.
    ///
    /// Returns the number of translated units.
    pub async fn translate(&self, locale: &str, client: &DeeplClient) -> TranslationResult<usize> {
        let target_lang =
            deepl_language(locale).ok_or_else(|| TranslationError::UnsupportedLocale(locale.into()))?;

        let mut translated_units = 0;
        for file in self.core_files()? {
            let Some((domain, file_locale)) = split_file_name(&file) else {
                continue;
            };
            if file_locale != ENGLISH || file.extension().and_then(|e| e.to_str()) != Some("xlf") {
                continue;
            }

            let english = XliffDocument::load(&file)?;
            let target_file = self.translations_dir.join(format!("{domain}.{locale}.xlf"));
            let existing = if target_file.exists() {
                XliffDocument::load(&target_file)?.units
            } else {
                Vec::new()
            };

            let missing: Vec<&TransUnit> =
                english.units.iter().filter(|u| !existing.iter().any(|e| e.id == u.id)).collect();
            if missing.is_empty() {
                continue;
            }
            info!(domain = %domain, missing = missing.len(), "translating with DeepL");

            let mut units = existing.clone();
            for unit in missing {
                let text = unit.target.clone().unwrap_or_else(|| unit.source.clone());
                let mut copy = unit.clone();
                copy.target = Some(client.translate(&text, target_lang).await?);
                copy.target_state = None;
                units.push(copy);
                translated_units += 1;
            }

            let mut document = english.clone();
            document.units = units;
            document.set_file_attribute("target-language", locale);
            document.set_file_attribute("original", &format!("{domain}.en.xlf"));
            document.save(&target_file)?;
        }

        Ok(translated_units)
    }
}

fn targets_by_resname(file: &Path) -> TranslationResult<HashMap<String, String>> {
    let mut targets = HashMap::new();
    for unit in XliffDocument::load(file)?.units {
        let resname = unit.resname.ok_or_else(|| TranslationError::MissingResname(file.into()))?;
        targets.insert(resname, unit.target.unwrap_or_default());
    }
    Ok(targets)
}

fn fill_file(file: &Path, fallback: &HashMap<String, String>) -> TranslationResult<usize> {
    let mut document = XliffDocument::load(file)?;
    let mut filled = 0;

    for unit in &mut document.units {
        let Some(resname) = unit.resname.as_deref() else {
            continue;
        };
        if unit.has_target() {
            continue;
        }
        let value = fallback.get(resname).ok_or_else(|| TranslationError::MissingEnglish {
            key: resname.to_string(),
            file: file.to_path_buf(),
        })?;
        unit.target = Some(value.clone());
        unit.target_state = Some("needs-translation".to_string());
        filled += 1;
    }

    if filled > 0 {
        document.save(file)?;
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use kimai_common::testing::TempDir;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn xliff(locale: &str, units: &[(&str, Option<&str>, &str, &str)]) -> String {
        let body: String = units
            .iter()
            .map(|(id, resname, source, target)| {
                let resname = resname.map(|r| format!(" resname=\"{r}\"")).unwrap_or_default();
                format!(
                    "<trans-unit id=\"{id}\"{resname}><source>{source}</source><target>{target}</target></trans-unit>"
                )
            })
            .collect();
        format!(
            "<?xml version=\"1.0\"?><xliff version=\"1.2\" xmlns=\"urn:oasis:names:tc:xliff:document:1.2\">\
             <file source-language=\"en\" target-language=\"{locale}\" datatype=\"plaintext\" original=\"file.ext\">\
             <header><tool tool-id=\"x\"/></header><body>{body}</body></file></xliff>"
        )
    }

    struct Fixture {
        dir: TempDir,
        tool: TranslationTool,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new("kimai-translations").unwrap();
            dir.create_dir("translations").unwrap();
            let tool =
                TranslationTool::new(dir.path().join("translations"), dir.path().join("plugins"));
            Self { dir, tool }
        }

        fn write(&self, relative: &str, content: &str) -> PathBuf {
            self.dir.create_file(relative, content).unwrap()
        }
    }

    #[test]
    fn fallback_locales() {
        assert_eq!(fallback_locale("de_CH"), "de");
        assert_eq!(fallback_locale("pt-BR"), "pt");
        assert_eq!(fallback_locale("pt"), "pt_BR");
        assert_eq!(fallback_locale("fr"), "en");
    }

    #[test]
    fn collects_core_and_plugin_files() {
        let fx = Fixture::new();
        fx.write("translations/messages.en.xlf", &xliff("en", &[]));
        fx.write("translations/README.md", "ignored");
        fx.write("plugins/DemoBundle/Resources/translations/demo.de.xliff", &xliff("de", &[]));

        let files = fx.tool.all_files().unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[1].ends_with("demo.de.xliff"));
    }

    #[test]
    fn fix_resnames_sets_missing_resname_and_ids() {
        let fx = Fixture::new();
        let file = fx.write(
            "translations/messages.de.xlf",
            &xliff("de", &[("1", None, "login", "Anmelden"), ("2", Some("keep"), "logout", "")]),
        );

        assert_eq!(fx.tool.fix_resnames().unwrap(), 1);

        let content = std::fs::read_to_string(&file).unwrap();
        assert!(!content.contains("<header>"));
        let doc = XliffDocument::parse(&content, &file).unwrap();
        assert_eq!(doc.units[0].resname.as_deref(), Some("login"));
        assert_eq!(doc.units[0].id, generate_id("login"));
        assert_eq!(doc.units[1].resname.as_deref(), Some("keep"));
        assert_eq!(doc.units[1].id, generate_id("logout"));
    }

    #[test]
    fn duplicates_span_domains() {
        let fx = Fixture::new();
        fx.write("translations/messages.en.xlf", &xliff("en", &[("a", Some("name"), "Name", "")]));
        fx.write("translations/messages.de.xlf", &xliff("de", &[("a", Some("name"), "Name", "")]));
        fx.write("translations/validators.en.xlf", &xliff("en", &[("b", Some("name"), "Name", "")]));
        fx.write("translations/actions.en.xlf", &xliff("en", &[("c", Some("edit"), "Edit", "")]));

        let duplicates = fx.tool.duplicates().unwrap();
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates["name"], vec!["messages".to_string(), "validators".to_string()]);
    }

    #[test]
    fn delete_resname_only_touches_core_files() {
        let fx = Fixture::new();
        let core = fx.write(
            "translations/messages.en.xlf",
            &xliff("en", &[("a", Some("gone"), "Gone", "Gone"), ("b", Some("stay"), "Stay", "Stay")]),
        );
        let plugin = fx.write(
            "plugins/Demo/Resources/translations/messages.en.xlf",
            &xliff("en", &[("a", Some("gone"), "Gone", "Gone")]),
        );

        assert_eq!(fx.tool.delete_resname("gone").unwrap(), 1);
        assert_eq!(XliffDocument::load(&core).unwrap().units.len(), 1);
        assert_eq!(XliffDocument::load(&plugin).unwrap().units.len(), 1);
    }

    #[test]
    fn wrong_extensions_are_relative() {
        let fx = Fixture::new();
        fx.write("translations/messages.en.xlf", &xliff("en", &[]));
        fx.write("translations/validators.en.xliff", &xliff("en", &[]));

        assert_eq!(fx.tool.wrong_extensions().unwrap(), vec![PathBuf::from("messages.en.xlf")]);
    }

    #[test]
    fn fill_empty_uses_fallback_locale() {
        let fx = Fixture::new();
        fx.write(
            "translations/messages.en.xlf",
            &xliff("en", &[("a", Some("save"), "save", "Save"), ("b", Some("edit"), "edit", "")]),
        );
        fx.write("translations/messages.de.xlf", &xliff("de", &[("a", Some("save"), "save", "Speichern")]));
        let swiss = fx.write(
            "translations/messages.de_CH.xlf",
            &xliff("de_CH", &[("a", Some("save"), "save", "")]),
        );
        let french = fx.write(
            "translations/messages.fr.xlf",
            &xliff("fr", &[("a", Some("save"), "save", ""), ("b", Some("edit"), "edit", "Modifier")]),
        );

        assert_eq!(fx.tool.fill_empty().unwrap(), 2);

        let swiss = XliffDocument::load(&swiss).unwrap();
        assert_eq!(swiss.units[0].target.as_deref(), Some("Speichern"));
        assert_eq!(swiss.units[0].target_state.as_deref(), Some("needs-translation"));
        let french = XliffDocument::load(&french).unwrap();
        assert_eq!(french.units[0].target.as_deref(), Some("Save"));
        assert_eq!(french.units[1].target_state, None);
    }

    #[test]
    fn fill_empty_reports_missing_source_file_and_key() {
        let fx = Fixture::new();
        fx.write("translations/messages.fr.xlf", &xliff("fr", &[("a", Some("save"), "save", "")]));
        let err = fx.tool.fill_empty().unwrap_err();
        assert!(err.to_string().starts_with("Could not find translation file: "));
        assert!(err.to_string().ends_with("messages.en.xlf"));

        fx.write("translations/messages.en.xlf", &xliff("en", &[("x", Some("other"), "o", "O")]));
        let err = fx.tool.fill_empty().unwrap_err();
        assert!(matches!(err, TranslationError::MissingEnglish { ref key, .. } if key == "save"));
    }

    #[test]
    fn fill_empty_requires_resname_in_source() {
        let fx = Fixture::new();
        fx.write("translations/messages.en.xlf", &xliff("en", &[("a", None, "save", "Save")]));
        fx.write("translations/messages.fr.xlf", &xliff("fr", &[]));

        let err = fx.tool.fill_empty().unwrap_err();
        assert!(err.to_string().starts_with("Missing \"resname\" attribute in file: "));
    }

    #[test]
    fn lint_reports_broken_and_mismatched_files() {
        let fx = Fixture::new();
        fx.write("translations/messages.en.xlf", &xliff("en", &[]));
        fx.write("translations/messages.de.xlf", &xliff("fr", &[]));
        fx.write("translations/broken.de.xlf", "<xliff><file></body></xliff>");

        let problems = fx.tool.lint().unwrap();
        assert_eq!(problems.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn translate_writes_new_locale_file() {
        let fx = Fixture::new();
        fx.write(
            "translations/messages.en.xlf",
            &xliff("en", &[("a", Some("save"), "save", "Save"), ("b", Some("edit"), "edit", "Edit")]),
        );
        fx.write("translations/messages.it.xlf", &xliff("it", &[("a", Some("save"), "save", "Salva")]));

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"translations":[{"text":"Modifica"}]}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = DeeplClient::new(server.uri(), "key").unwrap();
        assert_eq!(fx.tool.translate("it", &client).await.unwrap(), 1);

        let written = XliffDocument::load(&fx.dir.path().join("translations/messages.it.xlf")).unwrap();
        assert_eq!(written.target_language(), Some("it"));
        assert_eq!(written.units.len(), 2);
        assert_eq!(written.units[1].target.as_deref(), Some("Modifica"));

        let unsupported = fx.tool.translate("sv", &client).await.unwrap_err();
        assert!(matches!(unsupported, TranslationError::UnsupportedLocale(_)));
    }
}
