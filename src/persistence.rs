//! # Persistência — Salvamento e Carregamento do Mapa em Disco
//!
//! Módulo responsável por gravar/ler um [`CognitiveMap`] como JSON, no
//! formato produzido por [`CognitiveMap::serialize`].
//!
//! ## Formato de Armazenamento
//!
//! O mapa é salvo como JSON "pretty-printed" (4 espaços) para facilitar
//! inspeção manual. As relações vão numa tabela separada com os predecessores
//! por nome; na carga os nomes são resolvidos de volta (ver `core::snapshot`).
//!
//! ## Mapas Compartilhados
//!
//! Quem precisa do mapa em várias threads usa [`SharedMap`]. O
//! [`save_shared`] segura um read lock só durante a codificação; a escrita
//! no disco acontece depois que o lock é liberado.
//!
//! ## ⚠️ Atomicidade
//!
//! A escrita **não é atômica**: um crash durante a escrita pode corromper
//! o arquivo.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::RwLock;

use crate::core::CognitiveMap;

/// Mapa protegido para acesso concorrente.
pub type SharedMap = Arc<RwLock<CognitiveMap>>;

/// Envolve `map` num [`SharedMap`].
pub fn shared(map: CognitiveMap) -> SharedMap {
    Arc::new(RwLock::new(map))
}

/// Salva o mapa em `path` como JSON pretty-printed.
///
/// Cria o diretório pai se não existir.
///
/// # Erros
///
/// Retorna erro se não conseguir criar o diretório, serializar,
/// ou escrever no arquivo.
pub fn save(map: &CognitiveMap, path: impl AsRef<Path>) -> Result<()> {
    let json = map.serialize().context("Falha ao serializar o mapa")?;
    write(path.as_ref(), &json)
}

/// Como [`save`], adquirindo um read lock no mapa compartilhado.
pub fn save_shared(map: &SharedMap, path: impl AsRef<Path>) -> Result<()> {
    let json = {
        let map_read = map.read();
        map_read.serialize().context("Falha ao serializar o mapa")?
    };
    write(path.as_ref(), &json)
}

fn write(path: &Path, json: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Falha ao criar diretório {}", parent.display()))?;
    }
    std::fs::write(path, json)
        .with_context(|| format!("Falha ao escrever {}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = json.len(), "Mapa salvo");
    Ok(())
}

/// Carrega um mapa de `path`.
///
/// # Erros
///
/// Retorna erro se o arquivo não existir, estiver corrompido ou violar a
/// integridade estrutural (relação apontando para conceito inexistente).
pub fn load(path: impl AsRef<Path>) -> Result<CognitiveMap> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Falha ao ler {}", path.display()))?;
    let map = CognitiveMap::from_json(&json)
        .with_context(|| format!("Falha ao desserializar {}", path.display()))?;
    tracing::info!(path = %path.display(), concepts = map.len(), "Mapa carregado");
    Ok(map)
}

/// Carrega o mapa de `path`, ou cria um vazio se o arquivo não existir ou
/// não puder ser lido.
pub fn load_or_default(path: impl AsRef<Path>) -> CognitiveMap {
    let path = path.as_ref();
    if !path.exists() {
        tracing::info!("Nenhum {} encontrado, iniciando mapa vazio", path.display());
        return CognitiveMap::new();
    }
    match load(path) {
        Ok(map) => map,
        Err(e) => {
            tracing::warn!(error = %format!("{:#}", e), "Mapa ilegível, iniciando mapa vazio");
            CognitiveMap::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_path() -> std::path::PathBuf {
        std::env::temp_dir()
            .join(format!("fcm-{}", Uuid::new_v4()))
            .join("map.json")
    }

    #[test]
    fn save_then_load() {
        let path = temp_path();
        let mut fcm = CognitiveMap::from_values([("A", 0.25)]).unwrap();
        fcm.connect("A", "B").unwrap();
        fcm.save(&path).unwrap();

        let back = CognitiveMap::load(&path).unwrap();
        assert_eq!(back.list(), "A;B");
        assert_eq!(back.list_preceding("B").unwrap(), "A");
        assert_eq!(back.value("A").unwrap(), 0.25);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn shared_map_saves_under_read_lock() {
        let path = temp_path();
        let map = shared(CognitiveMap::from_values([("X", 1.0)]).unwrap());
        save_shared(&map, &path).unwrap();
        map.write().set_value("X", 0.0).unwrap();
        assert_eq!(load(&path).unwrap().value("X").unwrap(), 1.0);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn load_missing_file_fails_but_default_recovers() {
        let path = temp_path();
        assert!(load(&path).is_err());
        assert!(load_or_default(&path).is_empty());
    }

    #[test]
    fn corrupt_file_falls_back_to_empty() {
        let path = temp_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"concepts": {}, "relations": {"B": {"kind": "SimpleSigmoid", "previousNames": ["A"], "params": {"weights": [1.0]}}}}"#).unwrap();
        let err = load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("integridade estrutural"));
        assert!(load_or_default(&path).is_empty());
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
