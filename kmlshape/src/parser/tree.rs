//! Arbre XML générique à noms de balises normalisés
//!
//! Les préfixes de namespace sont retirés à la construction (suffix
//! match du spec KML: `kml:Polygon`, `gx:Polygon` et `Polygon` sont
//! équivalents), et chaque noeud porte une référence explicite vers
//! son parent pour des tests d'ancêtres exacts.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::KmlShapeError;

/// Noeud de l'arbre: balise locale, texte accumulé, liens de parenté
#[derive(Debug)]
pub struct Node {
    /// Nom local de la balise, préfixe de namespace retiré
    pub tag: String,

    /// Texte concaténé des sections Text/CDATA du noeud
    pub text: Option<String>,

    /// Indice du parent (None pour une racine)
    pub parent: Option<usize>,

    /// Indices des enfants, dans l'ordre du document
    pub children: Vec<usize>,
}

/// Arbre de document; les indices des noeuds suivent l'ordre du document
#[derive(Debug)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, idx: usize) -> &Node {
        &self.nodes[idx]
    }

    /// Descendants de `idx` en ordre préfixe (ordre du document), `idx` exclu
    pub fn descendants(&self, idx: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self.nodes[idx].children.iter().rev().copied().collect();

        while let Some(i) = stack.pop() {
            out.push(i);
            stack.extend(self.nodes[i].children.iter().rev());
        }

        out
    }

    /// Ancêtres de `idx`, du parent immédiat vers la racine
    pub fn ancestors(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(self.nodes[idx].parent, move |&i| self.nodes[i].parent)
    }
}

/// Parse un document KML en arbre générique.
///
/// Un XML malformé est fatal: la conversion entière est abandonnée,
/// aucune sortie partielle n'est produite.
pub fn parse(document: &str) -> Result<Tree, KmlShapeError> {
    let mut reader = Reader::from_str(document);
    reader.config_mut().trim_text(true);
    reader.config_mut().check_end_names = true;

    let mut nodes: Vec<Node> = Vec::new();
    let mut stack: Vec<usize> = Vec::new();
    let mut saw_root = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let idx = open_node(&mut nodes, &stack, local_name(e.name().local_name().as_ref()));
                stack.push(idx);
                saw_root = true;
            }
            Ok(Event::Empty(e)) => {
                open_node(&mut nodes, &stack, local_name(e.name().local_name().as_ref()));
                saw_root = true;
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| KmlShapeError::xml_parse(e.to_string()))?;
                append_text(&mut nodes, &stack, &text);
            }
            Ok(Event::CData(t)) => {
                let raw = t.into_inner();
                append_text(&mut nodes, &stack, &String::from_utf8_lossy(&raw));
            }
            Ok(Event::End(_)) => {
                stack.pop();
            }
            Ok(Event::Eof) => break,
            Ok(_) => {} // déclaration, commentaires, PI
            Err(e) => return Err(KmlShapeError::xml_parse(e.to_string())),
        }
    }

    if !stack.is_empty() {
        return Err(KmlShapeError::xml_parse("unclosed element at end of document"));
    }
    if !saw_root {
        return Err(KmlShapeError::xml_parse("document has no root element"));
    }

    Ok(Tree { nodes })
}

fn open_node(nodes: &mut Vec<Node>, stack: &[usize], tag: String) -> usize {
    let idx = nodes.len();
    let parent = stack.last().copied();

    nodes.push(Node {
        tag,
        text: None,
        parent,
        children: Vec::new(),
    });

    if let Some(p) = parent {
        nodes[p].children.push(idx);
    }

    idx
}

fn append_text(nodes: &mut [Node], stack: &[usize], text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(&idx) = stack.last() {
        nodes[idx].text.get_or_insert_with(String::new).push_str(text);
    }
}

fn local_name(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_namespace_prefixes() {
        let tree = parse(r#"<kml:kml><kml:Placemark><kml:name>A</kml:name></kml:Placemark></kml:kml>"#)
            .unwrap();

        let tags: Vec<&str> = tree.nodes().iter().map(|n| n.tag.as_str()).collect();
        assert_eq!(tags, ["kml", "Placemark", "name"]);
        assert_eq!(tree.nodes()[2].text.as_deref(), Some("A"));
    }

    #[test]
    fn test_parent_links_and_descendants() {
        let tree = parse("<kml><Placemark><Polygon><coordinates>1,2</coordinates></Polygon></Placemark></kml>")
            .unwrap();

        // kml=0, Placemark=1, Polygon=2, coordinates=3
        assert_eq!(tree.node(3).parent, Some(2));
        assert_eq!(tree.descendants(1), vec![2, 3]);

        let chain: Vec<&str> = tree
            .ancestors(3)
            .map(|i| tree.node(i).tag.as_str())
            .collect();
        assert_eq!(chain, ["Polygon", "Placemark", "kml"]);
    }

    #[test]
    fn test_empty_element_event() {
        let tree = parse("<kml><Placemark/></kml>").unwrap();
        assert_eq!(tree.node(1).tag, "Placemark");
        assert!(tree.node(1).children.is_empty());
    }

    #[test]
    fn test_malformed_xml_is_fatal() {
        assert!(parse("<kml><Placemark></kml>").is_err());
        assert!(parse("not xml at all").is_err());
        assert!(parse("").is_err());
    }

    #[test]
    fn test_cdata_and_entities() {
        let tree = parse("<d><description><![CDATA[a <b> c]]></description><name>x &amp; y</name></d>")
            .unwrap();
        assert_eq!(tree.node(1).text.as_deref(), Some("a <b> c"));
        assert_eq!(tree.node(2).text.as_deref(), Some("x & y"));
    }
}
