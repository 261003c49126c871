//! Survey content: instructions, training pairs and rewrite sources, and
//! construction of the ordered page list.

use std::path::Path;

use serde::Deserialize;

use crate::error::ContentError;

use super::page::{Page, PageKind};

/// One row of the training paragraph table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrainingRow {
    #[serde(rename = "PageTitle")]
    pub title: String,
    #[serde(rename = "Paragraph1")]
    pub paragraph1: String,
    #[serde(rename = "Paragraph2")]
    pub paragraph2: String,
    #[serde(rename = "Icon", default)]
    pub icon: Option<String>,
}

/// A test-session text: the original paragraph the model rewrites, and a
/// generic rewrite produced ahead of time to compare against.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RewriteSource {
    pub title: String,
    pub original: String,
    pub generic_rewrite: String,
}

/// Built-in test-session texts, taken from the stable Wikipedia revisions of
/// "Plate tectonics" (oldid 1191104944) and "Electricity" (oldid 1191110291).
pub fn default_rewrite_sources() -> Vec<RewriteSource> {
    vec![
        RewriteSource {
            title: "Topic 5: Plate Tectonics".to_string(),
            original: "Earth's lithosphere, the rigid outer shell of the planet including the crust \
                       and upper mantle, is fractured into seven or eight major plates (depending on \
                       how they are defined) and many minor plates or 'platelets'. Where the plates \
                       meet, their relative motion determines the type of plate boundary (or fault): \
                       convergent, divergent, or transform. Faults tend to be geologically active, \
                       experiencing earthquakes, volcanic activity, mountain-building, and oceanic \
                       trench formation."
                .to_string(),
            generic_rewrite: "The Earth's lithosphere, composed of the crust and part of the mantle, \
                              is segmented into seven or eight principal plates and numerous smaller \
                              ones. These plates intersect at boundaries where their movement relative \
                              to each other characterizes the boundary type: convergent, divergent, \
                              or transform. Boundaries where plates interact are often sites of \
                              geological activity, such as earthquakes, volcanism, the creation of \
                              mountains, and the development of oceanic trenches."
                .to_string(),
        },
        RewriteSource {
            title: "Topic 6: Electricity".to_string(),
            original: "The movement of electric charge is known as an electric current, the \
                       intensity of which is usually measured in amperes. Electric current can flow \
                       through some things, electrical conductors, but will not flow through an \
                       electrical insulator. By historical convention, a positive current is defined \
                       as having the same direction of flow as any positive charge it contains, or to \
                       flow from the most positive part of a circuit to the most negative part. \
                       Current defined in this manner is called conventional current."
                .to_string(),
            generic_rewrite: "Electric current refers to the flow of electric charge, typically \
                              measured in amperes. Certain materials, known as electrical conductors, \
                              allow the passage of electric current, whereas electrical insulators do \
                              not support such flow. Traditionally, positive current is described as \
                              moving in the same direction as any contained positive charge or from \
                              the positive to the negative end of a circuit. This type of current is \
                              known as conventional current."
                .to_string(),
        },
    ]
}

/// Everything needed to build the page list.
#[derive(Debug, Clone)]
pub struct SurveyContent {
    pub instructions: String,
    pub training: Vec<TrainingRow>,
    pub rewrite_sources: Vec<RewriteSource>,
}

impl SurveyContent {
    /// Load content from disk. Without a rewrite-source file the built-in
    /// texts are used.
    pub fn load(
        instructions_path: &Path,
        paragraphs_path: &Path,
        rewrites_path: Option<&Path>,
    ) -> Result<Self, ContentError> {
        let instructions =
            std::fs::read_to_string(instructions_path).map_err(|source| ContentError::Read {
                path: instructions_path.to_path_buf(),
                source,
            })?;

        let training = read_training_rows(paragraphs_path)?;

        let rewrite_sources = match rewrites_path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ContentError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                serde_json::from_str(&raw).map_err(|source| ContentError::RewriteSources {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            None => default_rewrite_sources(),
        };

        let content = Self {
            instructions,
            training,
            rewrite_sources,
        };
        content.validate()?;
        Ok(content)
    }

    fn validate(&self) -> Result<(), ContentError> {
        if self.training.is_empty() {
            return Err(ContentError::Empty("training paragraphs"));
        }
        if self.rewrite_sources.is_empty() {
            return Err(ContentError::Empty("rewrite sources"));
        }
        Ok(())
    }

    /// Build the ordered page list: welcome, instructions, one page per
    /// training row, one placeholder per rewrite source, closing.
    pub fn build_pages(&self) -> Vec<Page> {
        let mut kinds: Vec<(String, PageKind)> = Vec::with_capacity(
            self.training.len() + self.rewrite_sources.len() + 3,
        );

        kinds.push((
            "Welcome".to_string(),
            PageKind::Welcome {
                text: "Welcome to the Learning Preference Survey!".to_string(),
            },
        ));
        kinds.push((
            "Instructions".to_string(),
            PageKind::Instructions {
                text: self.instructions.clone(),
            },
        ));

        for row in &self.training {
            kinds.push((
                row.title.clone(),
                PageKind::TrainingPair {
                    option1: row.paragraph1.clone(),
                    option2: row.paragraph2.clone(),
                    icon: row.icon.clone(),
                },
            ));
        }

        for (i, source) in self.rewrite_sources.iter().enumerate() {
            kinds.push((
                source.title.clone(),
                PageKind::GeneratedPair {
                    interaction: i + 1,
                    content: None,
                },
            ));
        }

        kinds.push(("Close".to_string(), PageKind::Closing));

        kinds
            .into_iter()
            .enumerate()
            .map(|(index, (title, kind))| Page { index, title, kind })
            .collect()
    }
}

fn read_training_rows(path: &Path) -> Result<Vec<TrainingRow>, ContentError> {
    let mut reader = csv::Reader::from_path(path).map_err(|source| ContentError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    reader
        .deserialize()
        .collect::<Result<Vec<TrainingRow>, csv::Error>>()
        .map_err(|source| ContentError::Csv {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn load_builds_tagged_pages_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let instructions = write_file(&dir, "instructions.txt", "Pick the one you like.");
        let csv = write_file(
            &dir,
            "input_paragraphs.csv",
            "PageTitle,Paragraph1,Paragraph2\n\
             Topic 1: Water Cycle,\"Water, step by step.\",Water as a picture.\n\
             Topic 2: Climate,Facts first.,Big ideas first.\n",
        );

        let content = SurveyContent::load(&instructions, &csv, None).unwrap();
        assert_eq!(content.training.len(), 2);
        assert_eq!(content.training[0].paragraph1, "Water, step by step.");
        assert_eq!(content.training[0].icon, None);

        let pages = content.build_pages();
        // welcome + instructions + 2 training + 2 generated + closing
        assert_eq!(pages.len(), 7);
        assert!(matches!(pages[0].kind, PageKind::Welcome { .. }));
        assert!(matches!(pages[1].kind, PageKind::Instructions { ref text } if text == "Pick the one you like."));
        assert!(matches!(pages[2].kind, PageKind::TrainingPair { .. }));
        assert_eq!(pages[3].title, "Topic 2: Climate");
        assert_eq!(pages[4].interaction(), Some(1));
        assert_eq!(pages[5].title, "Topic 6: Electricity");
        assert!(matches!(pages[6].kind, PageKind::Closing));
        for (i, page) in pages.iter().enumerate() {
            assert_eq!(page.index, i);
        }
    }

    #[test]
    fn icon_column_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        let instructions = write_file(&dir, "i.txt", "x");
        let csv = write_file(
            &dir,
            "p.csv",
            "PageTitle,Paragraph1,Paragraph2,Icon\nT,a,b,Icons/WaterCycle.png\n",
        );
        let content = SurveyContent::load(&instructions, &csv, None).unwrap();
        assert_eq!(content.training[0].icon.as_deref(), Some("Icons/WaterCycle.png"));
    }

    #[test]
    fn rewrite_sources_override() {
        let dir = tempfile::tempdir().unwrap();
        let instructions = write_file(&dir, "i.txt", "x");
        let csv = write_file(&dir, "p.csv", "PageTitle,Paragraph1,Paragraph2\nT,a,b\n");
        let rewrites = write_file(
            &dir,
            "r.json",
            r#"[{"title": "Topic 5: Volcanoes", "original": "orig", "generic_rewrite": "gen"}]"#,
        );
        let content = SurveyContent::load(&instructions, &csv, Some(&rewrites)).unwrap();
        assert_eq!(content.rewrite_sources.len(), 1);
        assert_eq!(content.build_pages().len(), 5);
    }

    #[test]
    fn missing_instructions_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let csv = write_file(&dir, "p.csv", "PageTitle,Paragraph1,Paragraph2\nT,a,b\n");
        let err = SurveyContent::load(&dir.path().join("nope.txt"), &csv, None).unwrap_err();
        assert!(matches!(err, ContentError::Read { .. }));
    }

    #[test]
    fn empty_table_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let instructions = write_file(&dir, "i.txt", "x");
        let csv = write_file(&dir, "p.csv", "PageTitle,Paragraph1,Paragraph2\n");
        let err = SurveyContent::load(&instructions, &csv, None).unwrap_err();
        assert!(matches!(err, ContentError::Empty("training paragraphs")));
    }

    #[test]
    fn defaults_have_two_sources() {
        let sources = default_rewrite_sources();
        assert_eq!(sources.len(), 2);
        assert!(sources[0].original.starts_with("Earth's lithosphere"));
        assert!(sources[1].generic_rewrite.ends_with("conventional current."));
    }
}
