// src/services/document_service.rs

use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use genpdf::{elements, fonts, style, Alignment, Element};
use image::{imageops::FilterType, DynamicImage, ImageFormat, Luma};
use qrcode::QrCode;

use crate::{
    common::error::AppError,
    db::OrganizationRepository,
    models::{member::Member, tenancy::Organization},
};

const FONT_FAMILY: &str = "Roboto";
const NOT_INFORMED: &str = "não informado";

// Tamanho de cartão de crédito (ISO/IEC 7810 ID-1), em mm
const CARD_WIDTH_MM: f64 = 85.6;
const CARD_HEIGHT_MM: f64 = 54.0;

#[derive(Clone)]
pub struct DocumentService {
    org_repo: OrganizationRepository,
    fonts_dir: PathBuf,
    upload_dir: PathBuf,
}

fn pdf_error(e: impl std::fmt::Display) -> AppError {
    AppError::InternalServerError(anyhow::Error::msg(e.to_string()))
}

/// Conteúdo do QR da carteirinha.
pub fn card_qr_payload(member: &Member) -> String {
    format!("ID:{}|{}", member.id, member.name)
}

/// Renderiza o QR em tons de cinza (sem canal alfa, que o genpdf não aceita).
pub fn qr_image(payload: &str) -> Result<DynamicImage, AppError> {
    let code = QrCode::new(payload.as_bytes()).map_err(pdf_error)?;
    let buffer = code
        .render::<Luma<u8>>()
        .quiet_zone(true)
        .min_dimensions(200, 200)
        .build();
    Ok(DynamicImage::ImageLuma8(buffer))
}

// Concordância de gênero do texto da declaração
struct Wording {
    treatment: &'static str,
    nationality: &'static str,
    holder: &'static str,
    referred: &'static str,
}

impl Wording {
    fn for_member(member: &Member) -> Self {
        if member.is_male() {
            Self {
                treatment: "o Sr.",
                nationality: "brasileiro",
                holder: "portador",
                referred: "o referido membro",
            }
        } else {
            Self {
                treatment: "a Sra.",
                nationality: "brasileira",
                holder: "portadora",
                referred: "a referida membro",
            }
        }
    }
}

fn or_default(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(NOT_INFORMED)
}

/// Corpo da declaração de membresia, em parágrafos.
pub fn declaration_paragraphs(member: &Member, org: &Organization) -> Vec<String> {
    let w = Wording::for_member(member);
    vec![
        format!(
            "Declaramos, para os devidos fins de direito e a quem possa interessar, \
             especialmente para comprovação junto a instituições de ensino, que {} {}, {}, {}, \
             {} do RG nº {}, CPF nº {}, residente e domiciliado(a) na {}, nesta cidade, \
             é membro ativo(a) e em regular comunhão com esta instituição religiosa.",
            w.treatment,
            member.name.to_uppercase(),
            w.nationality,
            or_default(&member.marital_status),
            w.holder,
            or_default(&member.rg),
            or_default(&member.cpf),
            or_default(&member.address),
        ),
        format!(
            "Atestamos que {} frequenta as atividades desta organização religiosa, \
             cuja natureza jurídica é de Organização Religiosa (322-0), devidamente inscrita \
             no CNPJ sob o nº {}.",
            w.referred,
            or_default(&org.cnpj),
        ),
        "Por ser expressão da verdade, firmamos a presente declaração.".to_string(),
    ]
}

pub fn place_and_date(org: &Organization, date: NaiveDate) -> String {
    format!("{}, {}.", or_default(&org.city_state), date.format("%d/%m/%Y"))
}

/// Decodifica a foto enviada (PNG, JPEG...) e normaliza para RGBA.
pub fn decode_photo(bytes: &[u8]) -> Result<DynamicImage, AppError> {
    let img = image::load_from_memory(bytes).map_err(|e| AppError::InvalidImage(e.to_string()))?;
    Ok(DynamicImage::ImageRgba8(img.to_rgba8()))
}

fn centered(text: impl Into<String>, style: style::Style) -> impl Element {
    let mut p = elements::Paragraph::new(text.into());
    p.set_alignment(Alignment::Center);
    p.styled(style)
}

impl DocumentService {
    pub fn new(org_repo: OrganizationRepository, fonts_dir: PathBuf, upload_dir: PathBuf) -> Self {
        Self { org_repo, fonts_dir, upload_dir }
    }

    fn load_fonts(&self) -> Result<fonts::FontFamily<fonts::FontData>, AppError> {
        fonts::from_files(&self.fonts_dir, FONT_FAMILY, None).map_err(|_| {
            AppError::FontNotFound(format!(
                "Fonte {} não encontrada em {}",
                FONT_FAMILY,
                self.fonts_dir.display()
            ))
        })
    }

    async fn organization_of(&self, member: &Member) -> Result<Organization, AppError> {
        self.org_repo
            .find_by_id(member.tenant_id)
            .await?
            .ok_or(AppError::OrganizationNotFound)
    }

    /// Declaração de membresia (A4). O membro já deve ter sido lido pela Session.
    pub async fn declaration_pdf(&self, member: &Member, date: NaiveDate) -> Result<Vec<u8>, AppError> {
        let org = self.organization_of(member).await?;

        let mut doc = genpdf::Document::new(self.load_fonts()?);
        doc.set_title("Declaração de Membresia");
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(25);
        doc.set_page_decorator(decorator);

        // --- CABEÇALHO ---
        doc.push(centered(org.name.clone(), style::Style::new().bold().with_font_size(14)));
        doc.push(centered(
            format!("CNPJ: {}", or_default(&org.cnpj)),
            style::Style::new().with_font_size(10),
        ));
        doc.push(elements::Break::new(2));

        doc.push(centered(
            "DECLARAÇÃO DE MEMBRESIA",
            style::Style::new().bold().with_font_size(16),
        ));
        doc.push(elements::Break::new(2));

        // --- CORPO ---
        for paragraph in declaration_paragraphs(member, &org) {
            doc.push(elements::Paragraph::new(paragraph).styled(style::Style::new().with_font_size(12)));
            doc.push(elements::Break::new(1));
        }
        doc.push(elements::Break::new(2));

        let mut when = elements::Paragraph::new(place_and_date(&org, date));
        when.set_alignment(Alignment::Right);
        doc.push(when);
        doc.push(elements::Break::new(4));

        // --- ASSINATURA ---
        doc.push(centered("_______________________________", style::Style::new()));
        doc.push(centered(
            or_default(&org.responsible_name).to_string(),
            style::Style::new().bold().with_font_size(12),
        ));
        doc.push(centered(
            or_default(&org.responsible_title).to_string(),
            style::Style::new().with_font_size(10),
        ));

        // --- RODAPÉ ---
        doc.push(elements::Break::new(3));
        doc.push(centered(
            format!("{}, {}", or_default(&org.address), or_default(&org.city_state)),
            style::Style::new().italic().with_font_size(8),
        ));

        let mut buffer = Vec::new();
        doc.render(&mut buffer).map_err(pdf_error)?;
        Ok(buffer)
    }

    /// Grava a foto da carteirinha, sempre como PNG, em `UPLOAD_DIR/member_{id}.png`.
    pub async fn save_photo(&self, member: &Member, bytes: Vec<u8>) -> Result<PathBuf, AppError> {
        let photo = decode_photo(&bytes)?;
        let dir = self.upload_dir.clone();
        let path = self.photo_path(member);

        let target = path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), AppError> {
            std::fs::create_dir_all(&dir).map_err(anyhow::Error::from)?;
            photo
                .save_with_format(&target, ImageFormat::Png)
                .map_err(anyhow::Error::from)?;
            Ok(())
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task da foto: {}", e))??;

        tracing::info!(member = %member.id, path = %path.display(), "foto salva");
        Ok(path)
    }

    fn photo_path(&self, member: &Member) -> PathBuf {
        self.upload_dir.join(format!("member_{}.png", member.id))
    }

    // Foto é opcional: qualquer falha vira o quadro "SEM FOTO"
    fn load_photo(path: &Path) -> Option<DynamicImage> {
        if !path.exists() {
            return None;
        }
        match image::open(path) {
            Ok(img) => {
                let resized = img.resize_exact(240, 300, FilterType::Triangle);
                Some(DynamicImage::ImageRgb8(resized.to_rgb8()))
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "foto ilegível: {}", e);
                None
            }
        }
    }

    /// Carteirinha de membro em PDF, no tamanho de um cartão.
    pub async fn card_pdf(&self, member: &Member, issued_on: NaiveDate) -> Result<Vec<u8>, AppError> {
        let org = self.organization_of(member).await?;

        let mut doc = genpdf::Document::new(self.load_fonts()?);
        doc.set_title(format!("Carteirinha - {}", member.name));
        doc.set_paper_size(genpdf::Size::new(CARD_WIDTH_MM, CARD_HEIGHT_MM));
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(3);
        doc.set_page_decorator(decorator);

        let label = style::Style::new().with_font_size(5);
        let value = style::Style::new().bold().with_font_size(7);

        doc.push(centered(org.name.to_uppercase(), style::Style::new().bold().with_font_size(8)));
        doc.push(centered("MEMBRO OFICIAL", style::Style::new().bold().with_font_size(6)));
        doc.push(elements::Break::new(0.5));

        let mut photo = elements::LinearLayout::vertical();
        match Self::load_photo(&self.photo_path(member)) {
            Some(img) => photo.push(
                elements::Image::from_dynamic_image(img)
                    .map_err(pdf_error)?
                    .with_scale(genpdf::Scale::new(0.25, 0.25)),
            ),
            None => photo.push(elements::Paragraph::new("SEM FOTO").styled(label)),
        }

        let birth = member
            .birth_date
            .map(|d| d.format("%d/%m/%Y").to_string())
            .unwrap_or_else(|| "--/--".to_string());

        let mut data = elements::LinearLayout::vertical();
        data.push(elements::Paragraph::new("NOME COMPLETO").styled(label));
        data.push(elements::Paragraph::new(member.name.to_uppercase()).styled(value));
        data.push(elements::Paragraph::new("CARGO / FUNÇÃO").styled(label));
        data.push(elements::Paragraph::new(member.position.to_uppercase()).styled(value));
        data.push(elements::Paragraph::new("NASCIMENTO / MEMBRO DESDE").styled(label));
        data.push(
            elements::Paragraph::new(format!("{}   {}", birth, issued_on.year())).styled(value),
        );

        let qr = elements::Image::from_dynamic_image(qr_image(&card_qr_payload(member))?)
            .map_err(pdf_error)?
            .with_scale(genpdf::Scale::new(0.3, 0.3));

        // Pesos das colunas: Foto (2), Dados (4), QR (2)
        let mut table = elements::TableLayout::new(vec![2, 4, 2]);
        table
            .row()
            .element(photo)
            .element(data)
            .element(qr)
            .push()
            .map_err(pdf_error)?;
        doc.push(table);

        let mut buffer = Vec::new();
        doc.render(&mut buffer).map_err(pdf_error)?;
        Ok(buffer)
    }
}
