//! Minimal Office Open XML presentation writer.
//!
//! Produces a single-master, single-layout package with absolutely
//! positioned text boxes. Theme colors and typography are baked into each
//! run so the deck renders the same in any viewer.

use std::io::{Cursor, Write};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use quick_xml::escape::escape;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{CollaboratorError, PresentationRenderer};
use crate::job::{Slide, SlideContent};
use crate::theme::{Color, Theme};

pub const PPTX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";

const TITLE_SLIDE_SUBTITLE: &str = "Generated from audio transcript";
const BULLET: &str = "\u{2022} ";

// 16:9 in EMU.
const SLIDE_WIDTH: i64 = 12_192_000;
const SLIDE_HEIGHT: i64 = 6_858_000;
const MARGIN: i64 = 609_600;

const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Renders decks on the blocking pool.
#[derive(Debug, Default, Clone)]
pub struct PptxRenderer;

impl PptxRenderer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PresentationRenderer for PptxRenderer {
    async fn render(
        &self,
        content: &SlideContent,
        theme: &Theme,
    ) -> Result<Vec<u8>, CollaboratorError> {
        let content = content.clone();
        let theme = theme.clone();
        tokio::task::spawn_blocking(move || build_package(&content, &theme)).await?
    }
}

/// Writes the complete `.pptx` archive: a title slide followed by one slide
/// per entry in `content.slides`.
pub fn build_package(content: &SlideContent, theme: &Theme) -> Result<Vec<u8>, CollaboratorError> {
    let slide_count = content.slides.len() + 1;
    let mut package = Package::new();

    package.add("[Content_Types].xml", &content_types(slide_count))?;
    package.add("_rels/.rels", &root_rels())?;
    package.add("docProps/core.xml", &core_props(&content.title))?;
    package.add("docProps/app.xml", &app_props(slide_count))?;
    package.add("ppt/presentation.xml", &presentation(slide_count))?;
    package.add("ppt/_rels/presentation.xml.rels", &presentation_rels(slide_count))?;
    package.add("ppt/presProps.xml", &pres_props())?;
    package.add("ppt/theme/theme1.xml", &theme_part(theme))?;
    package.add("ppt/slideMasters/slideMaster1.xml", &slide_master(theme))?;
    package.add(
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        &relationships(&[
            ("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml"),
            ("rId2", "theme", "../theme/theme1.xml"),
        ]),
    )?;
    package.add("ppt/slideLayouts/slideLayout1.xml", &slide_layout())?;
    package.add(
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        &relationships(&[("rId1", "slideMaster", "../slideMasters/slideMaster1.xml")]),
    )?;

    let slide_rels = relationships(&[("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml")]);
    package.add("ppt/slides/slide1.xml", &title_slide(&content.title, theme))?;
    package.add("ppt/slides/_rels/slide1.xml.rels", &slide_rels)?;
    for (i, slide) in content.slides.iter().enumerate() {
        let n = i + 2;
        package.add(&format!("ppt/slides/slide{}.xml", n), &content_slide(slide, theme))?;
        package.add(&format!("ppt/slides/_rels/slide{}.xml.rels", n), &slide_rels)?;
    }

    package.finish()
}

struct Package {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
}

impl Package {
    fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
        }
    }

    fn add(&mut self, name: &str, xml: &str) -> Result<(), CollaboratorError> {
        self.writer.start_file(name, self.options)?;
        self.writer
            .write_all(xml.as_bytes())
            .map_err(|e| CollaboratorError::io(format!("Failed to write {}", name), e))
    }

    fn finish(self) -> Result<Vec<u8>, CollaboratorError> {
        Ok(self.writer.finish()?.into_inner())
    }
}

/// Escapes text for an XML text node, dropping control characters XML 1.0
/// cannot carry. Line breaks become spaces.
fn xml_text(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter_map(|c| match c {
            '\n' | '\r' | '\t' => Some(' '),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect();
    escape(cleaned.as_str()).into_owned()
}

fn content_types(slide_count: usize) -> String {
    let mut xml = format!(
        r#"{XML_DECL}<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/><Override PartName="/ppt/presProps.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presProps+xml"/><Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/><Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/><Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/><Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>"#
    );
    for n in 1..=slide_count {
        xml.push_str(&format!(
            r#"<Override PartName="/ppt/slides/slide{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#
        ));
    }
    xml.push_str("</Types>");
    xml
}

fn root_rels() -> String {
    format!(
        r#"{XML_DECL}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{REL_BASE}/officeDocument" Target="ppt/presentation.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/><Relationship Id="rId3" Type="{REL_BASE}/extended-properties" Target="docProps/app.xml"/></Relationships>"#
    )
}

fn relationships(rels: &[(&str, &str, &str)]) -> String {
    let mut xml = format!(
        r#"{XML_DECL}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#
    );
    for (id, kind, target) in rels {
        xml.push_str(&format!(
            r#"<Relationship Id="{id}" Type="{REL_BASE}/{kind}" Target="{target}"/>"#
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

fn core_props(title: &str) -> String {
    let created = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    format!(
        r#"{XML_DECL}<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><dc:title>{}</dc:title><dc:creator>slidegen</dc:creator><dcterms:created xsi:type="dcterms:W3CDTF">{created}</dcterms:created><dcterms:modified xsi:type="dcterms:W3CDTF">{created}</dcterms:modified></cp:coreProperties>"#,
        xml_text(title)
    )
}

fn app_props(slide_count: usize) -> String {
    format!(
        r#"{XML_DECL}<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties"><Application>slidegen</Application><PresentationFormat>Widescreen</PresentationFormat><Slides>{slide_count}</Slides></Properties>"#
    )
}

fn presentation(slide_count: usize) -> String {
    let mut xml = format!(
        r#"{XML_DECL}<p:presentation xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}" saveSubsetFonts="1"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>"#
    );
    for n in 1..=slide_count {
        xml.push_str(&format!(
            r#"<p:sldId id="{}" r:id="rId{}"/>"#,
            255 + n,
            3 + n
        ));
    }
    xml.push_str(&format!(
        r#"</p:sldIdLst><p:sldSz cx="{SLIDE_WIDTH}" cy="{SLIDE_HEIGHT}"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#
    ));
    xml
}

fn presentation_rels(slide_count: usize) -> String {
    let slide_targets: Vec<(String, String)> = (1..=slide_count)
        .map(|n| (format!("rId{}", 3 + n), format!("slides/slide{}.xml", n)))
        .collect();
    let mut rels: Vec<(&str, &str, &str)> = vec![
        ("rId1", "slideMaster", "slideMasters/slideMaster1.xml"),
        ("rId2", "theme", "theme/theme1.xml"),
        ("rId3", "presProps", "presProps.xml"),
    ];
    rels.extend(
        slide_targets
            .iter()
            .map(|(id, target)| (id.as_str(), "slide", target.as_str())),
    );
    relationships(&rels)
}

fn pres_props() -> String {
    format!(r#"{XML_DECL}<p:presentationPr xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"/>"#)
}

fn srgb(color: Color) -> String {
    format!(r#"<a:srgbClr val="{}"/>"#, color.hex())
}

fn solid_fill(color: Color) -> String {
    format!("<a:solidFill>{}</a:solidFill>", srgb(color))
}

fn theme_part(theme: &Theme) -> String {
    let c = &theme.colors;
    let font = xml_text(&theme.typography.font_family);
    let scheme = [
        ("dk1", c.text),
        ("lt1", c.background),
        ("dk2", c.primary),
        ("lt2", c.background),
        ("accent1", c.primary),
        ("accent2", c.secondary),
        ("accent3", c.accent),
        ("accent4", c.primary),
        ("accent5", c.secondary),
        ("accent6", c.accent),
        ("hlink", c.secondary),
        ("folHlink", c.primary),
    ];
    let colors: String = scheme
        .iter()
        .map(|(slot, color)| format!("<a:{slot}>{}</a:{slot}>", srgb(*color)))
        .collect();
    let fill = r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#;
    let line = r#"<a:ln w="6350"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#;
    let effect = "<a:effectStyle><a:effectLst/></a:effectStyle>";

    format!(
        r#"{XML_DECL}<a:theme xmlns:a="{NS_A}" name="{name}"><a:themeElements><a:clrScheme name="{name}">{colors}</a:clrScheme><a:fontScheme name="{name}"><a:majorFont><a:latin typeface="{font}"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="{font}"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme><a:fmtScheme name="{name}"><a:fillStyleLst>{fill}{fill}{fill}</a:fillStyleLst><a:lnStyleLst>{line}{line}{line}</a:lnStyleLst><a:effectStyleLst>{effect}{effect}{effect}</a:effectStyleLst><a:bgFillStyleLst>{fill}{fill}{fill}</a:bgFillStyleLst></a:fmtScheme></a:themeElements></a:theme>"#,
        name = xml_text(&theme.name),
    )
}

fn background(color: Color) -> String {
    format!(
        "<p:bg><p:bgPr>{}<a:effectLst/></p:bgPr></p:bg>",
        solid_fill(color)
    )
}

const GROUP_PROPS: &str = r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#;

fn slide_master(theme: &Theme) -> String {
    format!(
        r#"{XML_DECL}<p:sldMaster xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"><p:cSld>{bg}<p:spTree>{GROUP_PROPS}</p:spTree></p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst><p:txStyles><p:titleStyle/><p:bodyStyle/><p:otherStyle/></p:txStyles></p:sldMaster>"#,
        bg = background(theme.colors.background),
    )
}

fn slide_layout() -> String {
    format!(
        r#"{XML_DECL}<p:sldLayout xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}" type="blank" preserve="1"><p:cSld name="Blank"><p:spTree>{GROUP_PROPS}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#
    )
}

/// Position and size in EMU.
#[derive(Clone, Copy)]
struct Frame {
    x: i64,
    y: i64,
    cx: i64,
    cy: i64,
}

impl Frame {
    fn xfrm(&self) -> String {
        format!(
            r#"<a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
            self.x, self.y, self.cx, self.cy
        )
    }
}

struct Run<'a> {
    text: &'a str,
    size_pt: u32,
    bold: bool,
    color: Color,
    font: &'a str,
}

impl Run<'_> {
    fn paragraph(&self, align: &str) -> String {
        format!(
            r#"<a:p><a:pPr algn="{align}"><a:spcBef><a:spcPts val="600"/></a:spcBef></a:pPr><a:r><a:rPr lang="en-US" sz="{}" b="{}" dirty="0">{}<a:latin typeface="{}"/></a:rPr><a:t>{}</a:t></a:r></a:p>"#,
            self.size_pt * 100,
            if self.bold { 1 } else { 0 },
            solid_fill(self.color),
            xml_text(self.font),
            xml_text(self.text),
        )
    }
}

fn text_box(id: u32, name: &str, frame: Frame, anchor: &str, paragraphs: &str) -> String {
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr>{}<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr><p:txBody><a:bodyPr wrap="square" lIns="91440" tIns="45720" rIns="91440" bIns="45720" anchor="{anchor}"><a:normAutofit/></a:bodyPr><a:lstStyle/>{paragraphs}</p:txBody></p:sp>"#,
        frame.xfrm()
    )
}

fn accent_bar(id: u32, frame: Frame, color: Color) -> String {
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="Accent Bar"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr>{}<a:prstGeom prst="rect"><a:avLst/></a:prstGeom>{}<a:ln><a:noFill/></a:ln></p:spPr></p:sp>"#,
        frame.xfrm(),
        solid_fill(color)
    )
}

fn slide(theme: &Theme, shapes: &str) -> String {
    format!(
        r#"{XML_DECL}<p:sld xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"><p:cSld>{bg}<p:spTree>{GROUP_PROPS}{shapes}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#,
        bg = background(theme.colors.background),
    )
}

fn title_slide(title: &str, theme: &Theme) -> String {
    let t = &theme.typography;
    let width = SLIDE_WIDTH - 2 * MARGIN;
    let title_run = Run {
        text: title,
        size_pt: t.title_size,
        bold: true,
        color: theme.colors.primary,
        font: &t.font_family,
    };
    let subtitle_run = Run {
        text: TITLE_SLIDE_SUBTITLE,
        size_pt: t.subtitle_size,
        bold: false,
        color: theme.colors.secondary,
        font: &t.font_family,
    };

    let shapes = [
        text_box(
            2,
            "Title",
            Frame { x: MARGIN, y: 1_828_800, cx: width, cy: 1_828_800 },
            "b",
            &title_run.paragraph("ctr"),
        ),
        accent_bar(
            3,
            Frame { x: (SLIDE_WIDTH - 3_048_000) / 2, y: 3_779_520, cx: 3_048_000, cy: 76_200 },
            theme.colors.accent,
        ),
        text_box(
            4,
            "Subtitle",
            Frame { x: MARGIN, y: 4_023_360, cx: width, cy: 914_400 },
            "t",
            &subtitle_run.paragraph("ctr"),
        ),
    ]
    .concat();

    slide(theme, &shapes)
}

fn content_slide(content: &Slide, theme: &Theme) -> String {
    let t = &theme.typography;
    let width = SLIDE_WIDTH - 2 * MARGIN;
    let title_run = Run {
        text: &content.title,
        size_pt: t.heading_size,
        bold: true,
        color: theme.colors.primary,
        font: &t.font_family,
    };

    let mut shapes = vec![
        accent_bar(
            2,
            Frame { x: 0, y: 0, cx: SLIDE_WIDTH, cy: 137_160 },
            theme.colors.accent,
        ),
        text_box(
            3,
            "Title",
            Frame { x: MARGIN, y: 365_760, cx: width, cy: 1_143_000 },
            "b",
            &title_run.paragraph("l"),
        ),
    ];

    if !content.content.is_empty() {
        let bullets: String = content
            .content
            .iter()
            .map(|item| {
                let line = format!("{}{}", BULLET, item);
                Run {
                    text: &line,
                    size_pt: t.body_size,
                    bold: false,
                    color: theme.colors.text,
                    font: &t.font_family,
                }
                .paragraph("l")
            })
            .collect();
        shapes.push(text_box(
            4,
            "Content",
            Frame { x: MARGIN, y: 1_691_640, cx: width, cy: 4_663_440 },
            "t",
            &bullets,
        ));
    }

    slide(theme, &shapes.concat())
}
