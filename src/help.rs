//! Field descriptions shown next to each result field.

use tracing::warn;

const MATCH_HELP: &str = "Aquí podrás ver la coincidencia de la base de datos más parecida a la pregunta que has introducido.";
const CONFIDENCE_HELP: &str = "Aquí podrás ver el porcentaje de coincidencia de tu búsqueda con la mejor coincidencia encontrada en la base de datos.";
const ANSWER_HELP: &str = "Este campo contiene la respuesta a la coincidencia encontrada en la base de datos.\n\nRecuerda revisar que la coincidencia sea parecida o igual a tu pregunta original.";
const EXPLANATION_HELP: &str = "Este campo contiene la explicación de la respuesta, en caso de que exista en la base de datos.";

const TEXT_SOLVER: &[(&str, &str)] = &[
    (
        "input",
        "Aquí deberás escribir la pregunta que quieras resolver. Intenta que sea lo más parecida posible a las preguntas disponibles en la base de datos.\n\nCuanta más información contenga la pregunta, mayor será la probabilidad de obtener un resultado satisfactorio.",
    ),
    ("match", MATCH_HELP),
    ("confidence", CONFIDENCE_HELP),
    ("answer", ANSWER_HELP),
    ("explanation", EXPLANATION_HELP),
];

const IMAGE_SOLVER: &[(&str, &str)] = &[
    (
        "input",
        "Aquí deberás arrastrar una imagen de la pregunta que quieras buscar. Sirven capturas de pantalla e imagenes guardadas pero no siempre funciona con imagenes de páginas web directamente.\n\nRecuerda encuadrar lo máximo posible el texto a buscar, reduciendo así las posibilidades de falsos reconocimientos.",
    ),
    ("text", "Este campo contiene el texto escaneado de la imagen."),
    ("match", MATCH_HELP),
    ("confidence", CONFIDENCE_HELP),
    ("answer", ANSWER_HELP),
    ("explanation", EXPLANATION_HELP),
    (
        "tesseract-status",
        "Este campo contiene el estado actual de reconocimiento de texto de Tesseract (OCR).",
    ),
    (
        "tesseract-progress",
        "Este campo contiene el progreso de cada estado de procesamiento de Tesseract (OCR).",
    ),
];

/// Input mode whose fields are being described.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    TextSolver,
    ImageSolver,
}

impl Page {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "text-solver" => Some(Page::TextSolver),
            "image-solver" => Some(Page::ImageSolver),
            _ => None,
        }
    }

    fn table(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Page::TextSolver => TEXT_SOLVER,
            Page::ImageSolver => IMAGE_SOLVER,
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> {
        self.table().iter().map(|(field, _)| *field)
    }
}

/// Description of `field` on `page`, or `None` (logged) when either is unknown.
pub fn describe(page: &str, field: &str) -> Option<&'static str> {
    let Some(p) = Page::parse(page) else {
        warn!(page, "no help for page");
        return None;
    };
    let found = p
        .table()
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, text)| *text);
    if found.is_none() {
        warn!(page, field, "no help for field");
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_fields_have_same_text() {
        assert_eq!(describe("text-solver", "match"), describe("image-solver", "match"));
        assert!(describe("text-solver", "input").unwrap().starts_with("Aquí deberás escribir"));
    }

    #[test]
    fn ocr_fields_only_on_image_page() {
        assert!(describe("image-solver", "tesseract-status").is_some());
        assert!(describe("text-solver", "tesseract-status").is_none());
        assert!(Page::ImageSolver.fields().any(|f| f == "text"));
        assert!(!Page::TextSolver.fields().any(|f| f == "text"));
    }

    #[test]
    fn unknown_page_is_none() {
        assert!(describe("settings", "input").is_none());
    }
}
