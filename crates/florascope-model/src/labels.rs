//! Class labels for the classifier's output layer

use florascope_core::{Error, Result};
use std::path::Path;

/// The 102 flower species the bundled model was trained on, in output order.
///
/// Two names carry a trailing space; the exported model emits them that way.
pub const FLOWER_CLASSES: [&str; 102] = [
    "alpine sea holly",
    "anthurium",
    "artichoke",
    "azalea",
    "ball moss",
    "balloon flower",
    "barbeton daisy",
    "bearded iris",
    "bee balm",
    "bird of paradise",
    "bishop of llandaff",
    "black-eyed susan",
    "blackberry lily",
    "blanket flower",
    "bolero deep blue",
    "bougainvillea",
    "bromelia",
    "buttercup",
    "californian poppy",
    "camellia",
    "canna lily",
    "canterbury bells",
    "cape flower",
    "carnation",
    "cautleya spicata",
    "clematis",
    "colt's foot",
    "columbine",
    "common dandelion",
    "corn poppy",
    "cyclamen ",
    "daffodil",
    "desert-rose",
    "english marigold",
    "fire lily",
    "foxglove",
    "frangipani",
    "fritillary",
    "garden phlox",
    "gaura",
    "gazania",
    "geranium",
    "giant white arum lily",
    "globe thistle",
    "globe-flower",
    "grape hyacinth",
    "great masterwort",
    "hard-leaved pocket orchid",
    "hibiscus",
    "hippeastrum ",
    "japanese anemone",
    "king protea",
    "lenten rose",
    "lotus",
    "love in the mist",
    "magnolia",
    "mallow",
    "marigold",
    "mexican aster",
    "mexican petunia",
    "monkshood",
    "moon orchid",
    "morning glory",
    "orange dahlia",
    "osteospermum",
    "oxeye daisy",
    "passion flower",
    "pelargonium",
    "peruvian lily",
    "petunia",
    "pincushion flower",
    "pink primrose",
    "pink-yellow dahlia?",
    "poinsettia",
    "primula",
    "prince of wales feathers",
    "purple coneflower",
    "red ginger",
    "rose",
    "ruby-lipped cattleya",
    "siam tulip",
    "silverbush",
    "snapdragon",
    "spear thistle",
    "spring crocus",
    "stemless gentian",
    "sunflower",
    "sweet pea",
    "sweet william",
    "sword lily",
    "thorn apple",
    "tiger lily",
    "toad lily",
    "tree mallow",
    "tree poppy",
    "trumpet creeper",
    "wallflower",
    "water lily",
    "watercress",
    "wild pansy",
    "windflower",
    "yellow iris",
];

/// Ordered class names indexed by output position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassLabels {
    names: Vec<String>,
}

impl ClassLabels {
    /// Create labels from any list of names
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(Error::config("Class label list is empty"));
        }
        Ok(Self { names })
    }

    /// The built-in flower classes
    pub fn flowers() -> Self {
        Self {
            names: FLOWER_CLASSES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Read one label per line, skipping blank lines
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read labels file {}: {}", path.display(), e))
        })?;

        Self::new(content.lines().filter(|line| !line.trim().is_empty()))
            .map_err(|_| Error::config(format!("Labels file {} has no labels", path.display())))
    }

    /// Label at the given output index
    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}
