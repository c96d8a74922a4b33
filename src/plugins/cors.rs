//! CORS middleware bound to the configured origins and methods

use serde_json::json;

use crate::codegen::utils::import_path;
use crate::codegen::{
    File, FileSet, ImportSpec, PatchMode, RegexPatch, Section, add_import, header, patch_file,
};
use crate::core::config::CorsConfig;
use crate::core::error::Result;
use crate::design::{Root, http_roots};
use crate::plugin::{GenContext, Plugin};
use crate::plugins::DEBUG_BLOCK;
use crate::scaffold;

pub const NAME: &str = "cors";

pub const MIDDLEWARE_PATH: &str = "gen/http/cors/cors.go";

/// Adds the CORS middleware package (`gen` hook)
pub struct Cors {
    config: CorsConfig,
}

/// Wraps the example server handler with the middleware (`example` hook)
pub struct CorsExample;

impl Cors {
    pub fn new(config: CorsConfig) -> Self {
        Self { config }
    }

    fn middleware_file(&self) -> File {
        File::new(
            MIDDLEWARE_PATH,
            vec![
                header(
                    "CORS Middleware",
                    "cors",
                    vec![ImportSpec::new("net/http"), ImportSpec::new("strings")],
                ),
                Section::new("cors-middleware", MIDDLEWARE_T).with_data(json!({
                    "origins": self.config.allowed_origins,
                    "methods": self.config.allowed_methods.join(", "),
                })),
            ],
        )
    }
}

impl Default for Cors {
    fn default() -> Self {
        Self::new(CorsConfig::default())
    }
}

impl Plugin for Cors {
    fn name(&self) -> &str {
        NAME
    }

    fn generate(&self, _ctx: &GenContext, roots: &[Root], mut files: FileSet) -> Result<FileSet> {
        if http_roots(roots).next().is_some() {
            files.push(self.middleware_file())?;
        }
        Ok(files)
    }
}

impl Plugin for CorsExample {
    fn name(&self) -> &str {
        NAME
    }

    fn generate(&self, ctx: &GenContext, roots: &[Root], mut files: FileSet) -> Result<FileSet> {
        let locator = ctx.locator();
        let spec = ImportSpec::aliased("cors", import_path(ctx.genpkg(), &["http", "cors"]));
        let patch = RegexPatch::new(
            DEBUG_BLOCK,
            "\thandler = cors.Handler(handler)\n\t",
            PatchMode::InsertAfterFirst,
        )?;

        for root in http_roots(roots) {
            for server in root.servers() {
                let Some(file) = locator.file_mut(&mut files, &scaffold::main_path(&server.name))? else {
                    continue;
                };
                if let Some(header) = locator.header_mut(file)? {
                    add_import(header, &spec);
                }
                patch_file(file, &patch, ctx.strictness())?;
            }
        }
        Ok(files)
    }
}

const MIDDLEWARE_T: &str = r#"
var allowedOrigins = []string{
{%- for origin in origins %}
	"{{ origin }}",
{%- endfor %}
}

const allowedMethods = "{{ methods }}"

// Handler returns a middleware that answers preflight requests and sets the
// CORS response headers for allowed origins.
func Handler(h http.Handler) http.Handler {
	return http.HandlerFunc(func(w http.ResponseWriter, r *http.Request) {
		origin := r.Header.Get("Origin")
		if origin == "" || !allowed(origin) {
			h.ServeHTTP(w, r)
			return
		}
		w.Header().Set("Access-Control-Allow-Origin", origin)
		w.Header().Set("Vary", "Origin")
		if r.Method == http.MethodOptions && r.Header.Get("Access-Control-Request-Method") != "" {
			w.Header().Set("Access-Control-Allow-Methods", allowedMethods)
			if headers := r.Header.Get("Access-Control-Request-Headers"); headers != "" {
				w.Header().Set("Access-Control-Allow-Headers", headers)
			}
			w.WriteHeader(http.StatusOK)
			return
		}
		h.ServeHTTP(w, r)
	})
}

func allowed(origin string) bool {
	for _, o := range allowedOrigins {
		if o == "*" || strings.EqualFold(o, origin) {
			return true
		}
	}
	return false
}
"#;
