use docintel_core::error::EmbeddingError;
use docintel_core::{
    extract_outline, extract_outlines_in_folder, load_run_config, Embedder, HeadingLevel,
    LayoutReader, LopdfLayoutReader, OutlineOptions, PipelineOptions, RelevancePipeline,
    RelevanceScorer,
};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

/// One line of text: font resource key, size, x, y, text.
type Line<'a> = (&'a str, f32, f32, f32, &'a str);

fn write_pdf(path: &Path, pages: &[Vec<Line<'_>>]) -> TestResult {
    let pages = pages
        .iter()
        .map(|lines| {
            lines
                .iter()
                .flat_map(|(font, size, x, y, text)| {
                    vec![
                        Operation::new("BT", vec![]),
                        Operation::new(
                            "Tf",
                            vec![Object::Name(font.as_bytes().to_vec()), Object::Real(*size)],
                        ),
                        Operation::new("Td", vec![Object::Real(*x), Object::Real(*y)]),
                        Operation::new("Tj", vec![Object::string_literal(*text)]),
                        Operation::new("ET", vec![]),
                    ]
                })
                .collect()
        })
        .collect();
    write_raw_pdf(path, pages)
}

/// Writes one page per operation list, with `F1` Helvetica and `F2` Helvetica-Bold available.
fn write_raw_pdf(path: &Path, pages: Vec<Vec<Operation>>) -> TestResult {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });
    let resources = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular,
            "F2" => bold,
        },
    });

    let mut kids = Vec::new();
    for operations in pages {
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ],
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path)?;
    Ok(())
}

fn op(operator: &str, operands: &[f32]) -> Operation {
    Operation::new(
        operator,
        operands.iter().map(|value| Object::Real(*value)).collect(),
    )
}

fn font(key: &str, size: f32) -> Operation {
    Operation::new("Tf", vec![Object::Name(key.as_bytes().to_vec()), Object::Real(size)])
}

fn show(text: &str) -> Operation {
    Operation::new("Tj", vec![Object::string_literal(text)])
}

fn report_pdf(path: &Path) -> TestResult {
    write_pdf(
        path,
        &[vec![
            ("F1", 24.0, 72.0, 740.0, "Doc Title"),
            ("F1", 14.0, 72.0, 700.0, "1. Introduction"),
            ("F1", 10.0, 72.0, 680.0, "Some body text."),
            ("F1", 12.0, 72.0, 650.0, "1.1 Background"),
        ]],
    )
}

fn travel_guide(path: &Path) -> TestResult {
    write_pdf(
        path,
        &[
            vec![
                ("F2", 16.0, 72.0, 740.0, "History Walks"),
                ("F1", 10.0, 72.0, 710.0, "The old town has a long history of trade and many museums worth a visit."),
            ],
            vec![
                ("F2", 16.0, 72.0, 740.0, "Beach Days"),
                ("F1", 10.0, 72.0, 710.0, "The beach is wide and sandy and it is a great place for a whole day out."),
                ("F2", 16.0, 72.0, 660.0, "Local Food"),
                ("F1", 10.0, 72.0, 630.0, "Try the food stalls near the beach where fresh fish is grilled every evening."),
            ],
        ],
    )
}

#[test]
fn layout_reader_recovers_lines_fonts_and_pages() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("guide.pdf");
    travel_guide(&path)?;

    let layout = LopdfLayoutReader.read_layout(&path)?;

    assert_eq!(layout.page_count(), 2);
    let second = layout.page(2).ok_or("missing page 2")?;
    let texts: Vec<_> = second.fragments.iter().map(|f| f.text.as_str()).collect();
    assert_eq!(texts[0], "Beach Days");
    assert_eq!(texts[2], "Local Food");
    assert!(second.fragments[0].has_bold());
    assert!(!second.fragments[1].has_bold());
    assert_eq!(second.fragments[0].mean_font_size(), 16.0);
    assert!(second.fragments.iter().all(|fragment| fragment.page == 2));
    Ok(())
}

#[test]
fn scaled_page_transform_sets_size_and_position() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("scaled.pdf");
    write_raw_pdf(
        &path,
        vec![vec![
            op("q", &[]),
            op("cm", &[0.75, 0.0, 0.0, 0.75, 0.0, 0.0]),
            op("BT", &[]),
            font("F1", 16.0),
            op("Td", &[100.0, 400.0]),
            show("Scaled Heading"),
            op("ET", &[]),
            op("Q", &[]),
            op("BT", &[]),
            font("F1", 16.0),
            op("Td", &[100.0, 400.0]),
            show("Unscaled Heading"),
            op("ET", &[]),
        ]],
    )?;

    let layout = LopdfLayoutReader.read_layout(&path)?;
    let page = layout.page(1).ok_or("missing page 1")?;

    let unscaled = &page.fragments[0];
    assert_eq!(unscaled.text, "Unscaled Heading");
    assert_eq!(unscaled.mean_font_size(), 16.0);

    let scaled = &page.fragments[1];
    assert_eq!(scaled.text, "Scaled Heading");
    assert_eq!(scaled.mean_font_size(), 12.0);
    assert_eq!(scaled.bbox.x0, 75.0);
    Ok(())
}

#[test]
fn flipped_page_transform_keeps_reading_order() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("flipped.pdf");
    write_raw_pdf(
        &path,
        vec![vec![
            op("cm", &[1.0, 0.0, 0.0, -1.0, 0.0, 792.0]),
            op("BT", &[]),
            font("F1", 12.0),
            op("Tm", &[1.0, 0.0, 0.0, -1.0, 72.0, 600.0]),
            show("Lower Body"),
            op("Tm", &[1.0, 0.0, 0.0, -1.0, 72.0, 100.0]),
            show("Title At Top"),
            op("ET", &[]),
        ]],
    )?;

    let layout = LopdfLayoutReader.read_layout(&path)?;
    let page = layout.page(1).ok_or("missing page 1")?;
    let texts: Vec<_> = page.fragments.iter().map(|f| f.text.as_str()).collect();
    assert_eq!(texts, vec!["Title At Top", "Lower Body"]);
    assert!(page.fragments.iter().all(|f| f.mean_font_size() == 12.0));
    Ok(())
}

#[test]
fn shown_text_advances_the_pen() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("advance.pdf");
    write_raw_pdf(
        &path,
        vec![vec![
            op("BT", &[]),
            font("F1", 12.0),
            op("Td", &[72.0, 700.0]),
            show("Hello"),
            op("Td", &[30.0, 0.0]),
            show("World"),
            op("ET", &[]),
            op("BT", &[]),
            font("F1", 12.0),
            op("Td", &[72.0, 650.0]),
            show("Hel"),
            show("lo"),
            op("ET", &[]),
        ]],
    )?;

    let layout = LopdfLayoutReader.read_layout(&path)?;
    let page = layout.page(1).ok_or("missing page 1")?;
    let texts: Vec<_> = page.fragments.iter().map(|f| f.text.as_str()).collect();
    assert_eq!(texts, vec!["Hello World", "Hello"]);
    Ok(())
}

#[test]
fn outline_of_generated_report() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("report.pdf");
    report_pdf(&path)?;

    let outline = extract_outline(&LopdfLayoutReader, &path, &OutlineOptions::default());

    assert_eq!(outline.title, "Doc Title");
    let headings: Vec<_> = outline
        .headings
        .iter()
        .map(|heading| (heading.level, heading.text.as_str(), heading.page))
        .collect();
    assert_eq!(
        headings,
        vec![
            (HeadingLevel::H1, "Introduction", 1),
            (HeadingLevel::H2, "Background", 1),
        ]
    );

    let json = serde_json::to_value(&outline)?;
    assert_eq!(json["outline"][0]["level"], "H1");
    Ok(())
}

#[test]
fn batch_keeps_going_past_a_broken_document() -> TestResult {
    let input = tempdir()?;
    let output = tempdir()?;
    report_pdf(&input.path().join("good.pdf"))?;
    fs::write(input.path().join("bad.pdf"), b"not a pdf at all")?;

    let report = extract_outlines_in_folder(
        &LopdfLayoutReader,
        input.path(),
        output.path(),
        &OutlineOptions::default(),
    )?;

    assert_eq!(report.entries.len(), 2);
    assert_eq!(report.failed().count(), 1);

    let bad: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(output.path().join("bad.json"))?)?;
    assert_eq!(bad["title"], "Error Processing Document");

    let good: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(output.path().join("good.json"))?)?;
    assert_eq!(good["title"], "Doc Title");
    assert_eq!(good["outline"].as_array().map(Vec::len), Some(2));
    Ok(())
}

/// Keyword-presence vectors over a tiny fixed vocabulary.
struct KeywordEmbedder;

impl Embedder for KeywordEmbedder {
    fn dimensions(&self) -> usize {
        3
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let lowered = text.to_lowercase();
        Ok(["beach", "food", "history"]
            .iter()
            .map(|word| if lowered.contains(word) { 1.0 } else { 0.0 })
            .collect())
    }
}

#[test]
fn ranking_run_from_config_directory() -> TestResult {
    let input = tempdir()?;
    travel_guide(&input.path().join("guide.pdf"))?;
    fs::write(
        input.path().join("config.json"),
        r#"{"documents": ["guide.pdf", "missing.pdf"], "persona": "Food critic", "job_to_be_done": "Find the best beach"}"#,
    )?;

    let config = load_run_config(&input.path().join("config.json"))?;
    let scorer = RelevanceScorer::new(KeywordEmbedder, Default::default());
    let pipeline = RelevancePipeline::new(&LopdfLayoutReader, scorer, PipelineOptions::default());
    let report = pipeline.run(&config)?;

    let titles: Vec<_> = report
        .extracted_sections
        .iter()
        .map(|entry| entry.item.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Local Food", "Beach Days", "History Walks"]);
    assert_eq!(report.metadata.skipped_documents.len(), 1);

    let json = serde_json::to_value(&report)?;
    let first = &json["extracted_sections"][0];
    assert_eq!(first["document"], "guide.pdf");
    assert_eq!(first["page"], 2);
    assert_eq!(first["importance_rank"], 1);
    assert!(first.get("score").is_none());
    assert_eq!(json["metadata"]["input_documents"][1], "missing.pdf");
    Ok(())
}

#[test]
fn default_model_ranks_without_a_provider() -> TestResult {
    let input = tempdir()?;
    let guide = input.path().join("guide.pdf");
    travel_guide(&guide)?;

    let config = docintel_core::parse_run_config(
        r#"{"documents": ["guide.pdf"], "persona": "Traveller", "job_to_be_done": "Spend a day at the beach"}"#,
        input.path(),
    )?;
    let options = PipelineOptions::default();
    let scorer = RelevanceScorer::with_default_model(options.relevance.clone());
    let report = RelevancePipeline::new(&LopdfLayoutReader, scorer, options).run(&config)?;

    assert_eq!(report.extracted_sections.len(), 3);
    let ranks: Vec<_> = report
        .extracted_sections
        .iter()
        .map(|entry| entry.importance_rank)
        .collect();
    assert_eq!(ranks, vec![1, 2, 3]);
    assert!(report.subsection_analysis.len() <= 20);
    Ok(())
}
