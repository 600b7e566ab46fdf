//! PDF rendering for invoices and payment receipts.
//!
//! Plain `lopdf` primitives: one content stream per page, Helvetica base
//! fonts, A4 media box. Layout is fixed-position: header, two party blocks
//! side by side, an itemized table that paginates, and a totals block.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};

use super::words::amount_in_words;
use super::{InvoiceLine, InvoiceParty, InvoiceRecord, PaymentReceipt};
use crate::errors::ServiceError;

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 48.0;
const ROWS_PER_PAGE: usize = 28;
const ROW_HEIGHT: f32 = 18.0;

const COL_DESCRIPTION: f32 = MARGIN;
const COL_QUANTITY: f32 = 330.0;
const COL_UNIT_PRICE: f32 = 400.0;
const COL_SUBTOTAL: f32 = 490.0;

/// Coordinate helper; `Object::Real`'s inner width differs across lopdf
/// releases.
fn real(value: f32) -> Object {
    Object::Real(value.into())
}

/// Helvetica uses WinAnsi-compatible codes for the Latin-1 range; anything
/// outside it degrades to '?'. Keeps accented Spanish text legible without
/// embedding a font.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| {
            let code = c as u32;
            if code < 0x80 || (0xA0..=0xFF).contains(&code) {
                code as u8
            } else {
                b'?'
            }
        })
        .collect()
}

struct Page {
    operations: Vec<Operation>,
}

impl Page {
    fn new() -> Self {
        Self {
            operations: Vec::new(),
        }
    }

    fn text(&mut self, font: &str, size: i32, x: f32, y: f32, content: &str) {
        self.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![font.into(), size.into()]),
            Operation::new("Td", vec![real(x), real(y)]),
            Operation::new(
                "Tj",
                vec![Object::String(
                    encode_win_ansi(content),
                    StringFormat::Literal,
                )],
            ),
            Operation::new("ET", vec![]),
        ]);
    }

    fn rule(&mut self, x1: f32, y: f32, x2: f32) {
        self.operations.extend([
            Operation::new("w", vec![real(0.5)]),
            Operation::new("m", vec![real(x1), real(y)]),
            Operation::new("l", vec![real(x2), real(y)]),
            Operation::new("S", vec![]),
        ]);
    }
}

/// Assembles finished pages into a single PDF.
fn build_document(pages: Vec<Page>) -> Result<Vec<u8>, ServiceError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular_id,
            "F2" => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    let count = pages.len() as i64;
    for page in pages {
        let content = Content {
            operations: page.operations,
        };
        let encoded = content
            .encode()
            .map_err(|e| ServiceError::Render(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![real(0.0), real(0.0), real(PAGE_WIDTH), real(PAGE_HEIGHT)],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| ServiceError::Render(e.to_string()))?;
    Ok(buffer)
}

fn party_block(page: &mut Page, title: &str, party: &InvoiceParty, x: f32, top: f32) {
    page.text("F2", 10, x, top, title);
    let mut y = top - 14.0;
    let fields = [
        party.name.as_deref(),
        party.tax_id.as_deref(),
        party.address.as_deref(),
        party.phone.as_deref(),
        party.email.as_deref(),
    ];
    for field in fields.into_iter().flatten() {
        page.text("F1", 9, x, y, field);
        y -= 12.0;
    }
}

fn table_header(page: &mut Page, y: f32) {
    page.text("F2", 9, COL_DESCRIPTION, y, "Descripción");
    page.text("F2", 9, COL_QUANTITY, y, "Cantidad");
    page.text("F2", 9, COL_UNIT_PRICE, y, "Precio ud.");
    page.text("F2", 9, COL_SUBTOTAL, y, "Subtotal");
    page.rule(MARGIN, y - 5.0, PAGE_WIDTH - MARGIN);
}

fn table_row(page: &mut Page, y: f32, line: &InvoiceLine) {
    let description: String = line.description.chars().take(52).collect();
    page.text("F1", 9, COL_DESCRIPTION, y, &description);
    page.text("F1", 9, COL_QUANTITY, y, &line.quantity.to_string());
    page.text("F1", 9, COL_UNIT_PRICE, y, &format!("{:.2}", line.unit_price));
    page.text("F1", 9, COL_SUBTOTAL, y, &format!("{:.2}", line.subtotal()));
}

fn header(page: &mut Page, record: &InvoiceRecord, page_number: usize, page_count: usize) {
    page.text("F2", 18, MARGIN, PAGE_HEIGHT - 64.0, "FACTURA");
    let code = record.code.as_deref().unwrap_or("-");
    page.text("F1", 10, MARGIN, PAGE_HEIGHT - 82.0, &format!("Nº {code}"));
    page.text(
        "F1",
        10,
        MARGIN,
        PAGE_HEIGHT - 96.0,
        &format!("Estado: {}", record.status),
    );
    if let Some(issued_at) = record.issued_at {
        page.text(
            "F1",
            10,
            MARGIN,
            PAGE_HEIGHT - 110.0,
            &format!("Fecha: {}", issued_at.format("%d/%m/%Y")),
        );
    }
    if page_count > 1 {
        page.text(
            "F1",
            9,
            PAGE_WIDTH - MARGIN - 80.0,
            PAGE_HEIGHT - 64.0,
            &format!("Página {page_number}/{page_count}"),
        );
    }
}

/// Renders the canonical invoice: header, issuer/customer blocks, itemized
/// table across as many pages as needed, and the totals block (subtotal
/// equals total; no tax is modeled).
pub fn render_invoice(record: &InvoiceRecord) -> Result<Vec<u8>, ServiceError> {
    let chunks: Vec<&[InvoiceLine]> = if record.lines.is_empty() {
        vec![&[]]
    } else {
        record.lines.chunks(ROWS_PER_PAGE).collect()
    };
    let page_count = chunks.len();

    let mut pages = Vec::with_capacity(page_count);
    for (index, chunk) in chunks.into_iter().enumerate() {
        let mut page = Page::new();
        header(&mut page, record, index + 1, page_count);

        let mut table_top = PAGE_HEIGHT - 150.0;
        if index == 0 {
            party_block(&mut page, "Emisor", &record.issuer, MARGIN, PAGE_HEIGHT - 150.0);
            party_block(
                &mut page,
                "Cliente",
                &record.customer,
                PAGE_WIDTH / 2.0 + 10.0,
                PAGE_HEIGHT - 150.0,
            );
            table_top = PAGE_HEIGHT - 250.0;
        }

        table_header(&mut page, table_top);
        let mut y = table_top - ROW_HEIGHT;
        for line in chunk {
            table_row(&mut page, y, line);
            y -= ROW_HEIGHT;
        }

        if index == page_count - 1 {
            let total = record.total();
            page.rule(MARGIN, y + ROW_HEIGHT - 8.0, PAGE_WIDTH - MARGIN);
            page.text("F2", 10, COL_UNIT_PRICE, y - 4.0, "Subtotal");
            page.text("F1", 10, COL_SUBTOTAL, y - 4.0, &format!("{total:.2}"));
            page.text("F2", 11, COL_UNIT_PRICE, y - 22.0, "TOTAL");
            page.text("F2", 11, COL_SUBTOTAL, y - 22.0, &format!("{total:.2}"));
        }
        pages.push(page);
    }

    build_document(pages)
}

/// Renders the companion payment receipt for a (possibly partial) payment,
/// spelling the amount in words.
pub fn render_receipt(receipt: &PaymentReceipt) -> Result<Vec<u8>, ServiceError> {
    let mut page = Page::new();
    page.text("F2", 18, MARGIN, PAGE_HEIGHT - 64.0, "RECIBO DE PAGO");

    let code = receipt.order_code.as_deref().unwrap_or("-");
    page.text(
        "F1",
        10,
        MARGIN,
        PAGE_HEIGHT - 90.0,
        &format!("Pedido: {code}"),
    );
    if let Some(received_at) = receipt.received_at {
        page.text(
            "F1",
            10,
            MARGIN,
            PAGE_HEIGHT - 104.0,
            &format!("Fecha: {}", received_at.format("%d/%m/%Y")),
        );
    }
    if let Some(method) = receipt.method {
        page.text(
            "F1",
            10,
            MARGIN,
            PAGE_HEIGHT - 118.0,
            &format!("Forma de pago: {method}"),
        );
    }

    party_block(&mut page, "Pagador", &receipt.payer, MARGIN, PAGE_HEIGHT - 150.0);

    page.text(
        "F2",
        12,
        MARGIN,
        PAGE_HEIGHT - 240.0,
        &format!("Importe: {:.2}", receipt.amount),
    );
    page.text(
        "F1",
        10,
        MARGIN,
        PAGE_HEIGHT - 258.0,
        &format!("Son: {}", amount_in_words(receipt.amount)),
    );

    build_document(vec![page])
}
